use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::{Ownable, Ownership, ResourceKind};
use crate::directory::domain::EntityId;
use crate::directory::repository::{Record, Reference, UniqueKey};

/// Storage constraint over the raw `(student, course)` pair.
pub const ENROLLMENT_PAIR: &str = "enrollment_student_course";
/// Storage constraint over `(student, course)` among `enrolled` rows only.
pub const ACTIVE_ENROLLMENT_PAIR: &str = "enrollment_active_student_course";

pub const MAX_GRADE_LEN: usize = 5;

/// Lifecycle state of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    #[default]
    Enrolled,
    Dropped,
    Completed,
    Withdrawn,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 4] = [
        EnrollmentStatus::Enrolled,
        EnrollmentStatus::Dropped,
        EnrollmentStatus::Completed,
        EnrollmentStatus::Withdrawn,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Dropped => "dropped",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_active(self) -> bool {
        matches!(self, EnrollmentStatus::Enrolled)
    }
}

/// Which uniqueness rule the store enforces for enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrollmentUniqueness {
    /// At most one `enrolled` row per pair; re-enrolling after a drop adds a row.
    #[default]
    ActiveOnly,
    /// At most one row per pair regardless of status.
    StudentCourse,
}

impl EnrollmentUniqueness {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" | "active_only" => Some(Self::ActiveOnly),
            "student_course" | "pair" => Some(Self::StudentCourse),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ActiveOnly => "active",
            Self::StudentCourse => "student_course",
        }
    }

    /// Constraints the store must skip under this rule.
    pub const fn relaxed_constraints(self) -> &'static [&'static str] {
        match self {
            Self::ActiveOnly => &[ENROLLMENT_PAIR],
            Self::StudentCourse => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EntityId,
    pub student: EntityId,
    pub course: EntityId,
    pub status: EnrollmentStatus,
    pub grade: Option<String>,
    pub notes: Option<String>,
    pub enrollment_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Enrollment {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn mark_dropped(&mut self) {
        self.status = EnrollmentStatus::Dropped;
    }

    /// A missing grade leaves any existing one in place.
    pub fn mark_completed(&mut self, grade: Option<String>) {
        self.status = EnrollmentStatus::Completed;
        if let Some(grade) = grade {
            self.grade = Some(grade);
        }
    }

    pub fn same_pair(&self, other: &Enrollment) -> bool {
        self.student == other.student && self.course == other.course
    }

    fn pair_key(&self) -> String {
        format!("{}:{}", self.student, self.course)
    }
}

impl Record for Enrollment {
    const KIND: ResourceKind = ResourceKind::Enrollment;

    fn id(&self) -> EntityId {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::new("student", ResourceKind::Student, self.student),
            Reference::new("course", ResourceKind::Course, self.course),
        ]
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::new(ENROLLMENT_PAIR, self.pair_key())];
        if self.is_active() {
            keys.push(UniqueKey::new(ACTIVE_ENROLLMENT_PAIR, self.pair_key()));
        }
        keys
    }
}

impl Ownable for Enrollment {
    fn ownership(&self) -> Ownership {
        Ownership::InCourse(self.course)
    }
}

/// Body accepted by the enroll endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentRequest {
    pub student: Option<EntityId>,
    pub course: Option<EntityId>,
    pub notes: Option<String>,
}

/// Body accepted by full and partial enrollment updates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentInput {
    pub student: Option<EntityId>,
    pub course: Option<EntityId>,
    pub status: Option<EnrollmentStatus>,
    pub grade: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionRequest {
    pub grade: Option<String>,
}

/// Query filters for enrollment listings; absent fields match everything.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EnrollmentFilter {
    pub student: Option<u64>,
    pub course: Option<u64>,
    pub status: Option<EnrollmentStatus>,
}

impl EnrollmentFilter {
    pub fn status(status: Option<EnrollmentStatus>) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn matches(&self, enrollment: &Enrollment) -> bool {
        self.student.map_or(true, |id| enrollment.student == EntityId(id))
            && self.course.map_or(true, |id| enrollment.course == EntityId(id))
            && self.status.map_or(true, |status| enrollment.status == status)
    }
}

/// Enrollment with student, course and department names denormalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentView {
    pub id: EntityId,
    pub student: EntityId,
    pub course: EntityId,
    pub student_name: String,
    pub student_last_name: String,
    pub student_id_number: String,
    pub course_name: String,
    pub course_code: String,
    pub department_name: String,
    pub status: EnrollmentStatus,
    pub enrollment_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub grade: Option<String>,
    pub notes: Option<String>,
}

/// One row of a student's transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentEnrollmentView {
    pub id: EntityId,
    pub course: EntityId,
    pub course_name: String,
    pub course_code: String,
    pub course_description: Option<String>,
    pub department_name: String,
    pub status: EnrollmentStatus,
    pub enrollment_date: DateTime<Utc>,
    pub grade: Option<String>,
}

/// One row of a course roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseEnrollmentView {
    pub id: EntityId,
    pub student: EntityId,
    pub student_name: String,
    pub student_last_name: String,
    pub student_id_number: String,
    pub student_email: String,
    pub status: EnrollmentStatus,
    pub enrollment_date: DateTime<Utc>,
    pub grade: Option<String>,
    pub notes: Option<String>,
}

/// Counts by status; withdrawn rows only show up in `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrollmentStats {
    #[serde(rename = "total_enrollments")]
    pub total: usize,
    #[serde(rename = "active_enrollments")]
    pub active: usize,
    #[serde(rename = "completed_enrollments")]
    pub completed: usize,
    #[serde(rename = "dropped_enrollments")]
    pub dropped: usize,
}

impl EnrollmentStats {
    pub fn tally<'a, I>(enrollments: I) -> Self
    where
        I: IntoIterator<Item = &'a Enrollment>,
    {
        enrollments
            .into_iter()
            .fold(Self::default(), |mut stats, enrollment| {
                stats.total += 1;
                match enrollment.status {
                    EnrollmentStatus::Enrolled => stats.active += 1,
                    EnrollmentStatus::Completed => stats.completed += 1,
                    EnrollmentStatus::Dropped => stats.dropped += 1,
                    EnrollmentStatus::Withdrawn => {}
                }
                stats
            })
    }
}
