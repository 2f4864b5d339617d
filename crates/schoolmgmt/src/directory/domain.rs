use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::access::Role;

/// Store-assigned identifier, unique within one record type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct College {
    pub id: EntityId,
    pub name: String,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: EntityId,
    pub college_id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: EntityId,
    pub department_id: EntityId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: EntityId,
    pub course_id: EntityId,
    pub name: String,
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: EntityId,
    pub department_id: EntityId,
    pub first_name: String,
    pub last_name: String,
    /// Registrar-issued number, distinct from the record id.
    pub student_id: String,
    pub email: String,
    pub contact_number: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    pub id: EntityId,
    pub department_id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub contact_number: String,
}

/// Account record. Credentials live with the authentication gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub college_id: Option<EntityId>,
    pub department_id: Option<EntityId>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub is_active: bool,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: EntityId::default(),
            username: String::new(),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            role: Role::default(),
            phone: None,
            college_id: None,
            department_id: None,
            employee_id: None,
            student_id: None,
            date_of_birth: None,
            address: None,
            is_active: true,
            date_created: DateTime::<Utc>::default(),
            date_updated: DateTime::<Utc>::default(),
        }
    }
}

impl User {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }
}

/// Read-only projection returned by the profile endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: EntityId,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub role_display: &'static str,
    pub phone: Option<String>,
    pub college_id: Option<EntityId>,
    pub college_name: Option<String>,
    pub department_id: Option<EntityId>,
    pub department_name: Option<String>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub is_active: bool,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollegeInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentInput {
    pub college_id: Option<EntityId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseInput {
    pub department_id: Option<EntityId>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectInput {
    pub course_id: Option<EntityId>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentInput {
    pub department_id: Option<EntityId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub student_id: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfessorInput {
    pub department_id: Option<EntityId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub college_id: Option<EntityId>,
    pub department_id: Option<EntityId>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// Fields a user may change on their own account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}
