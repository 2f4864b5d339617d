use std::fmt;

use serde::Serialize;

use crate::directory::domain::EntityId;

/// Every record type the service stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    College,
    Department,
    Course,
    Subject,
    Student,
    Professor,
    User,
    Enrollment,
}

impl ResourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            ResourceKind::College => "college",
            ResourceKind::Department => "department",
            ResourceKind::Course => "course",
            ResourceKind::Subject => "subject",
            ResourceKind::Student => "student",
            ResourceKind::Professor => "professor",
            ResourceKind::User => "user",
            ResourceKind::Enrollment => "enrollment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which affiliation field a record exposes, declared per record type.
///
/// College and department records are their own scope targets; everything else points at
/// the parent it hangs off and is resolved by walking those references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    College(EntityId),
    Department {
        department: EntityId,
        college: EntityId,
    },
    InDepartment(EntityId),
    InCourse(EntityId),
    Account {
        user: EntityId,
        college: Option<EntityId>,
        department: Option<EntityId>,
    },
}

/// Capability implemented by every stored record.
pub trait Ownable {
    fn ownership(&self) -> Ownership;
}

/// Fully resolved affiliation of one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    pub college: Option<EntityId>,
    pub department: Option<EntityId>,
    pub user: Option<EntityId>,
}

impl Scope {
    pub fn college(college: EntityId) -> Self {
        Self {
            college: Some(college),
            ..Self::default()
        }
    }

    pub fn department(college: EntityId, department: EntityId) -> Self {
        Self {
            college: Some(college),
            department: Some(department),
            user: None,
        }
    }
}
