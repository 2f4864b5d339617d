use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::access::{Actor, Principal, Role};
use crate::directory::domain::{College, Course, Department, EntityId, Student, User};
use crate::directory::memory::InMemorySchoolRepository;
use crate::directory::repository::{Record, SchoolRepository};
use crate::directory::router::USER_ID_HEADER;
use crate::enrollment::domain::{EnrollmentRequest, EnrollmentUniqueness, EnrollmentView};
use crate::enrollment::service::EnrollmentService;

/// College A holds departments A1 and A2, college B holds B1.
pub(super) struct Registrar {
    pub repository: Arc<InMemorySchoolRepository>,
    pub service: Arc<EnrollmentService<InMemorySchoolRepository>>,
    pub intro: Course,
    pub algorithms: Course,
    pub optics: Course,
    pub amara: Student,
    pub farid: Student,
    pub admin: User,
    pub principal_a: User,
    pub dean_a1: User,
    pub teacher_a1: User,
    pub student_user: User,
}

pub(super) fn registrar() -> Registrar {
    registrar_with(EnrollmentUniqueness::ActiveOnly)
}

pub(super) fn registrar_with(uniqueness: EnrollmentUniqueness) -> Registrar {
    let repository = Arc::new(InMemorySchoolRepository::for_enrollment_uniqueness(
        uniqueness,
    ));
    let service = Arc::new(EnrollmentService::new(repository.clone()));

    let college_a = insert(
        &repository,
        College {
            name: "Northfield University".to_string(),
            ..College::default()
        },
    );
    let college_b = insert(
        &repository,
        College {
            name: "Lakeshore College".to_string(),
            ..College::default()
        },
    );
    let dept_a1 = insert(&repository, department(college_a.id, "Computer Science"));
    insert(&repository, department(college_a.id, "Mathematics"));
    let dept_b1 = insert(&repository, department(college_b.id, "Physics"));

    let intro = insert(&repository, course(dept_a1.id, "Introduction to Programming", "CS101"));
    let algorithms = insert(&repository, course(dept_a1.id, "Algorithms", "CS201"));
    let optics = insert(&repository, course(dept_b1.id, "Optics", "PHYS210"));

    let amara = insert(&repository, student(dept_a1.id, "Amara", "Okafor", "CS2024001"));
    let farid = insert(&repository, student(dept_b1.id, "Farid", "Reyes", "PHY2023002"));

    let admin = insert(&repository, user("admin", Role::Admin, None, None));
    let principal_a = insert(
        &repository,
        user("principal_a", Role::Principal, Some(college_a.id), None),
    );
    let dean_a1 = insert(
        &repository,
        user("dean_a1", Role::Dean, Some(college_a.id), Some(dept_a1.id)),
    );
    let teacher_a1 = insert(
        &repository,
        user("teacher_a1", Role::Teacher, Some(college_a.id), Some(dept_a1.id)),
    );
    let student_user = insert(
        &repository,
        user("amara", Role::Student, Some(college_a.id), Some(dept_a1.id)),
    );

    Registrar {
        repository,
        service,
        intro,
        algorithms,
        optics,
        amara,
        farid,
        admin,
        principal_a,
        dean_a1,
        teacher_a1,
        student_user,
    }
}

impl Registrar {
    pub(super) fn enroll_as_admin(&self, student: &Student, course: &Course) -> EnrollmentView {
        self.service
            .enroll(&actor(&self.admin), request(student, course))
            .expect("fixture enrollment")
    }
}

pub(super) fn insert<T: Record>(repository: &InMemorySchoolRepository, record: T) -> T {
    repository.insert(record).expect("fixture insert")
}

fn department(college_id: EntityId, name: &str) -> Department {
    Department {
        college_id,
        name: name.to_string(),
        ..Department::default()
    }
}

fn course(department_id: EntityId, name: &str, code: &str) -> Course {
    Course {
        department_id,
        name: name.to_string(),
        code: code.to_string(),
        ..Course::default()
    }
}

fn student(department_id: EntityId, first: &str, last: &str, number: &str) -> Student {
    Student {
        department_id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        student_id: number.to_string(),
        email: format!("{}@example.edu", first.to_ascii_lowercase()),
        contact_number: "555-0100".to_string(),
        ..Student::default()
    }
}

fn user(
    username: &str,
    role: Role,
    college_id: Option<EntityId>,
    department_id: Option<EntityId>,
) -> User {
    User {
        username: username.to_string(),
        role,
        college_id,
        department_id,
        ..User::default()
    }
}

pub(super) fn actor(user: &User) -> Actor {
    Actor::User(Principal::from_user(user))
}

pub(super) fn request(student: &Student, course: &Course) -> EnrollmentRequest {
    EnrollmentRequest {
        student: Some(student.id),
        course: Some(course.id),
        notes: None,
    }
}

pub(super) fn json_request(method: Method, uri: &str, user: Option<&User>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.id.to_string());
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn empty_request(method: Method, uri: &str, user: Option<&User>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.id.to_string());
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
