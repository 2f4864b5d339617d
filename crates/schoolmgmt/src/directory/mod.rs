//! Colleges, departments, courses, subjects, students, professors and user accounts.
//!
//! Every resource goes through [`DirectoryService`], which narrows reads to what the
//! caller's role can see and checks writes against the resolved college/department scope.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod resource;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    College, CollegeInput, Course, CourseInput, Department, DepartmentInput, EntityId,
    Professor, ProfessorInput, ProfileInput, Student, StudentInput, Subject, SubjectInput, User,
    UserInput, UserProfile,
};
pub use memory::InMemorySchoolRepository;
pub use repository::{Record, Reference, RepositoryError, SchoolRepository, UniqueKey};
pub use resource::Resource;
pub use router::{directory_router, user_id_from_headers, USER_ID_HEADER};
pub use service::DirectoryService;
pub use validation::{FieldErrors, WriteMode};
