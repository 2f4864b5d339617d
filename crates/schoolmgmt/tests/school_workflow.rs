use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use schoolmgmt::directory::{
    directory_router, DirectoryService, InMemorySchoolRepository, User, USER_ID_HEADER,
};
use schoolmgmt::enrollment::{enrollment_router, EnrollmentService, EnrollmentUniqueness};
use schoolmgmt::seed::{ensure_admin, populate, SeedPlan};

fn school(repository: InMemorySchoolRepository) -> Router {
    let repository = Arc::new(repository);
    directory_router(Arc::new(DirectoryService::new(repository.clone())))
        .merge(enrollment_router(Arc::new(EnrollmentService::new(repository))))
}

fn call(method: Method, uri: &str, admin: &User, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, admin.id.to_string());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json payload")
    };
    (status, body)
}

#[tokio::test]
async fn seeded_data_is_served_through_both_routers() {
    let repository = InMemorySchoolRepository::new();
    let summary = populate(&repository, &SeedPlan::default()).expect("seed");
    let admin = ensure_admin(&repository, "admin").expect("admin");
    let router = school(repository);

    let (status, colleges) = send(&router, call(Method::GET, "/api/v1/colleges", &admin, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(colleges.as_array().map(Vec::len), Some(summary.colleges));

    let (status, stats) = send(
        &router,
        call(Method::GET, "/api/v1/enrollments/stats", &admin, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_enrollments"], summary.enrollments.total);
    assert_eq!(stats["active_enrollments"], summary.enrollments.active);
    assert_eq!(stats["completed_enrollments"], summary.enrollments.completed);
    assert_eq!(stats["dropped_enrollments"], summary.enrollments.dropped);
}

#[tokio::test]
async fn enrollment_lifecycle_end_to_end() {
    let repository = InMemorySchoolRepository::for_enrollment_uniqueness(
        EnrollmentUniqueness::ActiveOnly,
    );
    let admin = ensure_admin(&repository, "registrar").expect("admin");
    let router = school(repository);

    let (status, college) = send(
        &router,
        call(
            Method::POST,
            "/api/v1/colleges",
            &admin,
            Some(json!({ "name": "Harborview College" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, department) = send(
        &router,
        call(
            Method::POST,
            "/api/v1/departments",
            &admin,
            Some(json!({ "college_id": college["id"], "name": "History" })),
        ),
    )
    .await;
    let (_, course) = send(
        &router,
        call(
            Method::POST,
            "/api/v1/courses",
            &admin,
            Some(json!({
                "department_id": department["id"],
                "name": "Modern Europe",
                "code": "HIST210",
            })),
        ),
    )
    .await;
    let (status, student) = send(
        &router,
        call(
            Method::POST,
            "/api/v1/students",
            &admin,
            Some(json!({
                "department_id": department["id"],
                "first_name": "Isla",
                "last_name": "Walsh",
                "student_id": "HIS2024007",
                "email": "isla.walsh@example.edu",
                "contact_number": "555-2007",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let enroll = json!({ "student": student["id"], "course": course["id"] });
    let (status, first) = send(
        &router,
        call(Method::POST, "/api/v1/enroll", &admin, Some(enroll.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["department_name"], "History");

    let drop_uri = format!("/api/v1/enrollments/{}/drop", first["id"]);
    let (status, dropped) = send(&router, call(Method::POST, &drop_uri, &admin, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dropped["status"], "dropped");

    let (status, second) = send(
        &router,
        call(Method::POST, "/api/v1/enroll", &admin, Some(enroll)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(second["id"], first["id"]);

    let complete_uri = format!("/api/v1/enrollments/{}/complete", second["id"]);
    let (status, completed) = send(
        &router,
        call(
            Method::POST,
            &complete_uri,
            &admin,
            Some(json!({ "grade": "A" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["grade"], "A");

    let history_uri = format!("/api/v1/students/{}/enrollments", student["id"]);
    let (_, history) = send(&router, call(Method::GET, &history_uri, &admin, None)).await;
    assert_eq!(history.as_array().map(Vec::len), Some(2));

    let college_uri = format!("/api/v1/colleges/{}", college["id"]);
    let (status, _) = send(&router, call(Method::DELETE, &college_uri, &admin, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let enrollment_uri = format!("/api/v1/enrollments/{}", second["id"]);
    let (status, body) = send(&router, call(Method::GET, &enrollment_uri, &admin, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));
}
