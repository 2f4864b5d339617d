use crate::access::ResourceKind;

use super::domain::EntityId;

/// Mandatory foreign key held by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub kind: ResourceKind,
    pub id: EntityId,
}

impl Reference {
    pub fn new(field: &'static str, kind: ResourceKind, id: EntityId) -> Self {
        Self { field, kind, id }
    }
}

/// Value that must be unique among rows of the same type under a named constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub constraint: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(constraint: &'static str, value: impl Into<String>) -> Self {
        Self {
            constraint,
            value: value.into(),
        }
    }
}

/// A row type the repository can persist.
pub trait Record: Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> EntityId;
    fn assign_id(&mut self, id: EntityId);

    /// Parents this row depends on; deleting any of them deletes the row.
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}

/// Storage abstraction with relational guarantees: foreign keys, unique keys and cascades.
///
/// Every call is atomic on its own; callers get no cross-call transaction.
pub trait SchoolRepository: Send + Sync {
    fn insert<T: Record>(&self, record: T) -> Result<T, RepositoryError>;
    fn update<T: Record>(&self, record: T) -> Result<T, RepositoryError>;
    fn fetch<T: Record>(&self, id: EntityId) -> Result<Option<T>, RepositoryError>;
    /// All rows in id order.
    fn list<T: Record>(&self) -> Result<Vec<T>, RepositoryError>;
    /// Removes the row and everything that transitively references it, returning the
    /// number of rows removed.
    fn delete<T: Record>(&self, id: EntityId) -> Result<usize, RepositoryError>;
    fn exists(&self, kind: ResourceKind, id: EntityId) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint `{constraint}` violated")]
    Conflict { constraint: &'static str },
    #[error("`{field}` references a missing {kind}")]
    MissingReference {
        field: &'static str,
        kind: ResourceKind,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
