//! Student/course enrollments: enroll, drop, complete, rosters and statistics.
//!
//! A student may hold at most one `enrolled` row per course. The service checks this
//! before every save and the store backs it with a unique constraint over active pairs.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CompletionRequest, CourseEnrollmentView, Enrollment, EnrollmentFilter, EnrollmentInput,
    EnrollmentRequest, EnrollmentStats, EnrollmentStatus, EnrollmentUniqueness, EnrollmentView,
    StudentEnrollmentView, ACTIVE_ENROLLMENT_PAIR, ENROLLMENT_PAIR,
};
pub use router::enrollment_router;
pub use service::EnrollmentService;
