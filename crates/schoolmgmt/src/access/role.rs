use serde::{Deserialize, Serialize};

use crate::directory::domain::{EntityId, User};

/// Closed set of roles a user account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Principal,
    Dean,
    Teacher,
    #[default]
    Student,
    Staff,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Principal,
        Role::Dean,
        Role::Teacher,
        Role::Student,
        Role::Staff,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Principal => "principal",
            Role::Dean => "dean",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Staff => "staff",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Role::Admin => "System Administrator",
            Role::Principal => "Principal",
            Role::Dean => "Dean",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
            Role::Staff => "Staff",
        }
    }

    /// Admin, principal and dean accounts.
    pub const fn is_management(self) -> bool {
        matches!(self, Role::Admin | Role::Principal | Role::Dean)
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.label().eq_ignore_ascii_case(value))
    }
}

/// Authenticated account with the affiliation fields the policy reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: EntityId,
    pub role: Role,
    pub college: Option<EntityId>,
    pub department: Option<EntityId>,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            college: user.college_id,
            department: user.department_id,
        }
    }
}

/// Whoever is behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(Principal),
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::User(principal) => Some(principal),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.principal().map(|principal| principal.role)
    }
}

impl From<Principal> for Actor {
    fn from(principal: Principal) -> Self {
        Actor::User(principal)
    }
}
