use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::access::{Actor, Principal, ResourceKind, Role};
use crate::directory::domain::{
    College, Course, Department, EntityId, Professor, Student, User,
};
use crate::directory::memory::InMemorySchoolRepository;
use crate::directory::repository::{Record, RepositoryError, SchoolRepository};
use crate::directory::router::USER_ID_HEADER;
use crate::directory::service::DirectoryService;

/// Two colleges; college A has two departments, college B one.
pub(super) struct Campus {
    pub repository: Arc<InMemorySchoolRepository>,
    pub service: Arc<DirectoryService<InMemorySchoolRepository>>,
    pub college_a: College,
    pub college_b: College,
    pub dept_a1: Department,
    pub dept_a2: Department,
    pub dept_b1: Department,
    pub course_a1: Course,
    pub student_a1: Student,
    pub professor_b1: Professor,
    pub admin: User,
    pub principal_a: User,
    pub dean_a1: User,
    pub teacher_a1: User,
    pub student_user: User,
}

pub(super) fn campus() -> Campus {
    let repository = Arc::new(InMemorySchoolRepository::new());
    let service = Arc::new(DirectoryService::new(repository.clone()));

    let college_a = insert(&repository, college("Northfield University"));
    let college_b = insert(&repository, college("Lakeshore College"));
    let dept_a1 = insert(&repository, department(college_a.id, "Computer Science"));
    let dept_a2 = insert(&repository, department(college_a.id, "Mathematics"));
    let dept_b1 = insert(&repository, department(college_b.id, "Physics"));
    let course_a1 = insert(&repository, course(dept_a1.id, "CS101"));
    insert(&repository, course(dept_b1.id, "PHYS101"));
    let student_a1 = insert(
        &repository,
        Student {
            department_id: dept_a1.id,
            first_name: "Amara".to_string(),
            last_name: "Okafor".to_string(),
            student_id: "CS2024001".to_string(),
            email: "amara@example.edu".to_string(),
            contact_number: "555-0101".to_string(),
            ..Student::default()
        },
    );
    let professor_b1 = insert(
        &repository,
        Professor {
            department_id: dept_b1.id,
            first_name: "Hiro".to_string(),
            last_name: "Tanaka".to_string(),
            specialization: "Optics".to_string(),
            contact_number: "555-0199".to_string(),
            ..Professor::default()
        },
    );

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
        user("student_a1", Role::Student, Some(college_a.id), Some(dept_a1.id)),
    );

    Campus {
        repository,
        service,
        college_a,
        college_b,
        dept_a1,
        dept_a2,
        dept_b1,
        course_a1,
        student_a1,
        professor_b1,
        admin,
        principal_a,
        dean_a1,
        teacher_a1,
        student_user,
    }
}

pub(super) fn insert<T: Record>(repository: &InMemorySchoolRepository, record: T) -> T {
    repository.insert(record).expect("fixture insert")
}

pub(super) fn college(name: &str) -> College {
    College {
        name: name.to_string(),
        ..College::default()
    }
}

pub(super) fn department(college_id: EntityId, name: &str) -> Department {
    Department {
        college_id,
        name: name.to_string(),
        ..Department::default()
    }
}

pub(super) fn course(department_id: EntityId, code: &str) -> Course {
    Course {
        department_id,
        name: format!("Course {code}"),
        code: code.to_string(),
        ..Course::default()
    }
}

pub(super) fn user(
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

pub(super) fn get_request(uri: &str, user: Option<&User>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
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

/// Store double whose every call fails.
pub(super) struct UnavailableRepository;

impl SchoolRepository for UnavailableRepository {
    fn insert<T: Record>(&self, _record: T) -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update<T: Record>(&self, _record: T) -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch<T: Record>(&self, _id: EntityId) -> Result<Option<T>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list<T: Record>(&self) -> Result<Vec<T>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete<T: Record>(&self, _id: EntityId) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn exists(&self, _kind: ResourceKind, _id: EntityId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
