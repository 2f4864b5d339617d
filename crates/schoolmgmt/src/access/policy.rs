//! Role/resource policy table.
//!
//! Reads and writes are each decided by a rule looked up from `(role, resource)`; the rule
//! is then bound to the principal's affiliation. Anonymous callers match nothing.

use crate::directory::domain::EntityId;

use super::role::{Actor, Role};
use super::scope::{ResourceKind, Scope};

/// Read rule before it is bound to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRule {
    All,
    OwnCollege,
    /// Own college when affiliated, otherwise everything.
    OwnCollegeOrAll,
    OwnDepartment,
    SelfOnly,
}

/// Write rule before it is bound to a principal and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRule {
    Allow,
    Deny,
    CollegeMatch,
    DepartmentMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Update,
    Delete,
}

/// Record-selection predicate applied before listing or looking up an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Nothing,
    All,
    College(EntityId),
    Department(EntityId),
    OnlyUser(EntityId),
}

impl Visibility {
    pub fn admits(&self, scope: &Scope) -> bool {
        match self {
            Visibility::Nothing => false,
            Visibility::All => true,
            Visibility::College(college) => scope.college == Some(*college),
            Visibility::Department(department) => scope.department == Some(*department),
            Visibility::OnlyUser(user) => scope.user == Some(*user),
        }
    }
}

pub fn read_rule(role: Role, kind: ResourceKind) -> ReadRule {
    use ResourceKind::*;

    match (role, kind) {
        (Role::Admin, _) => ReadRule::All,
        (Role::Principal, College) => ReadRule::OwnCollegeOrAll,
        (Role::Principal, _) => ReadRule::OwnCollege,
        (Role::Dean, College) => ReadRule::All,
        (Role::Dean, _) => ReadRule::OwnDepartment,
        (Role::Teacher | Role::Student | Role::Staff, User) => ReadRule::SelfOnly,
        (Role::Teacher | Role::Student | Role::Staff, _) => ReadRule::All,
    }
}

pub fn write_rule(role: Role, kind: ResourceKind, action: WriteAction) -> WriteRule {
    use ResourceKind::*;

    match (role, kind, action) {
        (Role::Admin, _, _) => WriteRule::Allow,
        (_, User, _) => WriteRule::Deny,
        (_, College, WriteAction::Create | WriteAction::Delete) => WriteRule::Deny,
        (Role::Principal, _, _) => WriteRule::CollegeMatch,
        (Role::Dean, College, _) | (Role::Dean, Department, WriteAction::Create) => {
            WriteRule::Deny
        }
        (Role::Dean, _, _) => WriteRule::DepartmentMatch,
        (Role::Teacher, Enrollment, WriteAction::Update) => WriteRule::DepartmentMatch,
        (Role::Teacher | Role::Student | Role::Staff, _, _) => WriteRule::Deny,
    }
}

/// Selection predicate for `kind` as seen by `actor`.
pub fn filter_visible(actor: &Actor, kind: ResourceKind) -> Visibility {
    let Some(principal) = actor.principal() else {
        return Visibility::Nothing;
    };

    match read_rule(principal.role, kind) {
        ReadRule::All => Visibility::All,
        ReadRule::OwnCollege => principal
            .college
            .map_or(Visibility::Nothing, Visibility::College),
        ReadRule::OwnCollegeOrAll => principal
            .college
            .map_or(Visibility::All, Visibility::College),
        ReadRule::OwnDepartment => principal
            .department
            .map_or(Visibility::Nothing, Visibility::Department),
        ReadRule::SelfOnly => Visibility::OnlyUser(principal.user_id),
    }
}

/// Whether `actor` may perform `action` on a `kind` record resolved to `target`.
///
/// For creates, `target` is the scope the new record would land in.
pub fn can_write(actor: &Actor, kind: ResourceKind, action: WriteAction, target: &Scope) -> bool {
    let Some(principal) = actor.principal() else {
        return false;
    };

    match write_rule(principal.role, kind, action) {
        WriteRule::Allow => true,
        WriteRule::Deny => false,
        WriteRule::CollegeMatch => matches_affiliation(principal.college, target.college),
        WriteRule::DepartmentMatch => {
            matches_affiliation(principal.department, target.department)
        }
    }
}

fn matches_affiliation(own: Option<EntityId>, target: Option<EntityId>) -> bool {
    matches!((own, target), (Some(own), Some(target)) if own == target)
}
