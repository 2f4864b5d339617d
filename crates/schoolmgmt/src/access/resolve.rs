use std::collections::HashMap;

use crate::directory::domain::{Course, Department, EntityId, User};
use crate::directory::repository::{RepositoryError, SchoolRepository};

use super::role::{Actor, Principal};
use super::scope::{Ownership, Scope};

/// Turn the `x-user-id` carried by a request into an actor.
///
/// Unknown and deactivated accounts are treated as anonymous rather than rejected.
pub fn authenticate<R>(repository: &R, user_id: Option<EntityId>) -> Result<Actor, RepositoryError>
where
    R: SchoolRepository,
{
    let Some(user_id) = user_id else {
        return Ok(Actor::Anonymous);
    };

    match repository.fetch::<User>(user_id)? {
        Some(user) if user.is_active => Ok(Actor::User(Principal::from_user(&user))),
        _ => Ok(Actor::Anonymous),
    }
}

/// Walks parent references to find the college/department a record belongs to.
///
/// Lookups are memoized, so one resolver should live for a single request.
pub struct ScopeResolver<'a, R> {
    repository: &'a R,
    department_colleges: HashMap<EntityId, Option<EntityId>>,
    course_departments: HashMap<EntityId, Option<EntityId>>,
}

impl<'a, R> ScopeResolver<'a, R>
where
    R: SchoolRepository,
{
    pub fn new(repository: &'a R) -> Self {
        Self {
            repository,
            department_colleges: HashMap::new(),
            course_departments: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, ownership: Ownership) -> Result<Scope, RepositoryError> {
        match ownership {
            Ownership::College(college) => Ok(Scope::college(college)),
            Ownership::Department {
                department,
                college,
            } => Ok(Scope::department(college, department)),
            Ownership::InDepartment(department) => self.department_scope(department),
            Ownership::InCourse(course) => match self.course_department(course)? {
                Some(department) => self.department_scope(department),
                None => Ok(Scope::default()),
            },
            Ownership::Account {
                user,
                college,
                department,
            } => {
                let college = match (college, department) {
                    (Some(college), _) => Some(college),
                    (None, Some(department)) => self.department_college(department)?,
                    (None, None) => None,
                };
                Ok(Scope {
                    college,
                    department,
                    user: Some(user),
                })
            }
        }
    }

    fn department_scope(&mut self, department: EntityId) -> Result<Scope, RepositoryError> {
        let college = self.department_college(department)?;
        Ok(Scope {
            college,
            department: Some(department),
            user: None,
        })
    }

    fn department_college(
        &mut self,
        department: EntityId,
    ) -> Result<Option<EntityId>, RepositoryError> {
        if let Some(college) = self.department_colleges.get(&department) {
            return Ok(*college);
        }
        let college = self
            .repository
            .fetch::<Department>(department)?
            .map(|record| record.college_id);
        self.department_colleges.insert(department, college);
        Ok(college)
    }

    fn course_department(&mut self, course: EntityId) -> Result<Option<EntityId>, RepositoryError> {
        if let Some(department) = self.course_departments.get(&course) {
            return Ok(*department);
        }
        let department = self
            .repository
            .fetch::<Course>(course)?
            .map(|record| record.department_id);
        self.course_departments.insert(course, department);
        Ok(department)
    }
}
