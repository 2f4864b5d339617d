use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::access::{
    authenticate, can_write, filter_visible, write_rule, Actor, ResourceKind, Role, Scope,
    ScopeResolver, Visibility, WriteAction, WriteRule,
};
use crate::error::{invalid_reference, ServiceError};

use super::domain::{College, Department, EntityId, ProfileInput, User, UserProfile};
use super::repository::{Record, SchoolRepository};
use super::resource::Resource;
use super::validation::{FieldErrors, WriteMode};

/// Role-scoped CRUD over every directory resource plus the account extras.
pub struct DirectoryService<R> {
    repository: Arc<R>,
}

impl<R> DirectoryService<R>
where
    R: SchoolRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn authenticate(&self, user_id: Option<EntityId>) -> Result<Actor, ServiceError> {
        Ok(authenticate(self.repository.as_ref(), user_id)?)
    }

    /// Every record of `T` the actor may see, in id order.
    pub fn list<T: Resource>(&self, actor: &Actor) -> Result<Vec<T>, ServiceError> {
        let visibility = filter_visible(actor, T::KIND);
        if visibility == Visibility::Nothing {
            return Ok(Vec::new());
        }

        let mut resolver = ScopeResolver::new(self.repository.as_ref());
        let mut visible = Vec::new();
        for record in self.repository.list::<T>()? {
            if visibility.admits(&resolver.resolve(record.ownership())?) {
                visible.push(record);
            }
        }
        Ok(visible)
    }

    pub fn retrieve<T: Resource>(&self, actor: &Actor, id: EntityId) -> Result<T, ServiceError> {
        let (record, _) = self.visible::<T>(actor, id)?;
        Ok(record)
    }

    pub fn create<T: Resource>(&self, actor: &Actor, input: T::Input) -> Result<T, ServiceError> {
        ensure_rule_allows(actor, T::KIND, WriteAction::Create)?;

        let mut record = T::default();
        record.apply(input, WriteMode::Create)?;
        check_references(self.repository.as_ref(), &record)?;

        let scope = ScopeResolver::new(self.repository.as_ref()).resolve(record.ownership())?;
        authorize(actor, T::KIND, WriteAction::Create, &scope)?;

        record.touch(Utc::now(), true);
        let stored = self.repository.insert(record)?;
        info!(kind = %T::KIND, id = %stored.id(), "record created");
        Ok(stored)
    }

    /// Full replacement when `mode` is [`WriteMode::Replace`], partial otherwise.
    pub fn update<T: Resource>(
        &self,
        actor: &Actor,
        id: EntityId,
        input: T::Input,
        mode: WriteMode,
    ) -> Result<T, ServiceError> {
        let (current, scope) = self.visible::<T>(actor, id)?;
        authorize(actor, T::KIND, WriteAction::Update, &scope)?;

        let mut record = current;
        record.apply(input, mode)?;
        check_references(self.repository.as_ref(), &record)?;

        let moved_to = ScopeResolver::new(self.repository.as_ref()).resolve(record.ownership())?;
        if moved_to != scope {
            authorize(actor, T::KIND, WriteAction::Update, &moved_to)?;
        }

        record.touch(Utc::now(), false);
        let stored = self.repository.update(record)?;
        info!(kind = %T::KIND, id = %id, "record updated");
        Ok(stored)
    }

    /// Returns how many rows went away, cascades included.
    pub fn delete<T: Resource>(&self, actor: &Actor, id: EntityId) -> Result<usize, ServiceError> {
        let (_, scope) = self.visible::<T>(actor, id)?;
        authorize(actor, T::KIND, WriteAction::Delete, &scope)?;

        let removed = self.repository.delete::<T>(id)?;
        info!(kind = %T::KIND, id = %id, removed, "record deleted");
        Ok(removed)
    }

    pub fn set_user_active(
        &self,
        actor: &Actor,
        id: EntityId,
        active: bool,
    ) -> Result<User, ServiceError> {
        let (mut user, scope) = self.visible::<User>(actor, id)?;
        authorize(actor, ResourceKind::User, WriteAction::Update, &scope)?;

        user.is_active = active;
        user.touch(Utc::now(), false);
        let stored = self.repository.update(user)?;
        info!(user = %id, active, "account activation changed");
        Ok(stored)
    }

    /// Visible accounts holding `role`, or all visible accounts without a filter.
    pub fn users_by_role(
        &self,
        actor: &Actor,
        role: Option<Role>,
    ) -> Result<Vec<UserProfile>, ServiceError> {
        match actor.role() {
            None => return Err(ServiceError::Unauthenticated),
            Some(Role::Admin | Role::Principal) => {}
            Some(_) => return Err(ServiceError::Forbidden),
        }

        self.list::<User>(actor)?
            .into_iter()
            .filter(|user| role.map_or(true, |role| user.role == role))
            .map(|user| self.profile_of(user))
            .collect()
    }

    pub fn profile(&self, actor: &Actor) -> Result<UserProfile, ServiceError> {
        let user = self.current_user(actor)?;
        self.profile_of(user)
    }

    pub fn update_profile(
        &self,
        actor: &Actor,
        input: ProfileInput,
    ) -> Result<UserProfile, ServiceError> {
        let mut user = self.current_user(actor)?;
        user.apply_profile(input)?;
        user.touch(Utc::now(), false);
        let stored = self.repository.update(user)?;
        info!(user = %stored.id, "profile updated");
        self.profile_of(stored)
    }

    fn current_user(&self, actor: &Actor) -> Result<User, ServiceError> {
        let principal = actor.principal().ok_or(ServiceError::Unauthenticated)?;
        self.repository
            .fetch::<User>(principal.user_id)?
            .ok_or(ServiceError::Unauthenticated)
    }

    fn profile_of(&self, user: User) -> Result<UserProfile, ServiceError> {
        let college_name = match user.college_id {
            Some(id) => self.repository.fetch::<College>(id)?.map(|college| college.name),
            None => None,
        };
        let department_name = match user.department_id {
            Some(id) => self
                .repository
                .fetch::<Department>(id)?
                .map(|department| department.name),
            None => None,
        };

        Ok(UserProfile {
            id: user.id,
            full_name: user.full_name(),
            role_display: user.role.display_name(),
            username: user.username,
            email: user.email,
            role: user.role,
            phone: user.phone,
            college_id: user.college_id,
            college_name,
            department_id: user.department_id,
            department_name,
            employee_id: user.employee_id,
            student_id: user.student_id,
            date_of_birth: user.date_of_birth,
            address: user.address,
            is_active: user.is_active,
            date_created: user.date_created,
        })
    }

    /// Fetch an instance the actor can see; hidden rows read as missing.
    fn visible<T: Resource>(&self, actor: &Actor, id: EntityId) -> Result<(T, Scope), ServiceError> {
        let visibility = filter_visible(actor, T::KIND);
        let record = self
            .repository
            .fetch::<T>(id)?
            .ok_or(ServiceError::NotFound(T::KIND))?;
        let scope = ScopeResolver::new(self.repository.as_ref()).resolve(record.ownership())?;
        if !visibility.admits(&scope) {
            return Err(ServiceError::NotFound(T::KIND));
        }
        Ok((record, scope))
    }
}

/// Reject writes the role table denies outright, before the payload is looked at.
pub(crate) fn ensure_rule_allows(
    actor: &Actor,
    kind: ResourceKind,
    action: WriteAction,
) -> Result<(), ServiceError> {
    match actor.role() {
        Some(role) if write_rule(role, kind, action) != WriteRule::Deny => Ok(()),
        _ => {
            debug!(%kind, ?action, role = ?actor.role(), "write denied by role");
            Err(ServiceError::Forbidden)
        }
    }
}

pub(crate) fn authorize(
    actor: &Actor,
    kind: ResourceKind,
    action: WriteAction,
    scope: &Scope,
) -> Result<(), ServiceError> {
    if can_write(actor, kind, action, scope) {
        Ok(())
    } else {
        debug!(%kind, ?action, ?scope, role = ?actor.role(), "write denied outside scope");
        Err(ServiceError::Forbidden)
    }
}

/// Report every dangling parent id as a field error.
pub(crate) fn check_references<R, T>(repository: &R, record: &T) -> Result<(), ServiceError>
where
    R: SchoolRepository,
    T: Record,
{
    let mut errors = FieldErrors::new();
    for reference in record.references() {
        if !repository.exists(reference.kind, reference.id)? {
            errors.add(reference.field, invalid_reference(reference.kind));
        }
    }
    Ok(errors.into_result()?)
}
