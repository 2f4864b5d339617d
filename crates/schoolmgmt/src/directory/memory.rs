use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::access::ResourceKind;
use crate::enrollment::EnrollmentUniqueness;

use super::domain::EntityId;
use super::repository::{Record, Reference, RepositoryError, SchoolRepository, UniqueKey};

struct Row {
    value: Box<dyn Any + Send + Sync>,
    references: Vec<Reference>,
    unique_keys: Vec<UniqueKey>,
}

#[derive(Default)]
struct Tables {
    rows: HashMap<ResourceKind, BTreeMap<EntityId, Row>>,
    sequences: HashMap<ResourceKind, u64>,
}

impl Tables {
    fn contains(&self, kind: ResourceKind, id: EntityId) -> bool {
        self.rows
            .get(&kind)
            .is_some_and(|table| table.contains_key(&id))
    }

    fn check_references(&self, references: &[Reference]) -> Result<(), RepositoryError> {
        match references
            .iter()
            .find(|reference| !self.contains(reference.kind, reference.id))
        {
            Some(missing) => Err(RepositoryError::MissingReference {
                field: missing.field,
                kind: missing.kind,
            }),
            None => Ok(()),
        }
    }

    fn check_unique(
        &self,
        kind: ResourceKind,
        own_id: Option<EntityId>,
        keys: &[UniqueKey],
        relaxed: &BTreeSet<&'static str>,
    ) -> Result<(), RepositoryError> {
        let Some(table) = self.rows.get(&kind) else {
            return Ok(());
        };

        for key in keys
            .iter()
            .filter(|key| !relaxed.contains(key.constraint))
        {
            let taken = table
                .iter()
                .filter(|(id, _)| Some(**id) != own_id)
                .any(|(_, row)| row.unique_keys.contains(key));
            if taken {
                return Err(RepositoryError::Conflict {
                    constraint: key.constraint,
                });
            }
        }
        Ok(())
    }

    fn dependents_of(&self, kind: ResourceKind, id: EntityId) -> Vec<(ResourceKind, EntityId)> {
        self.rows
            .iter()
            .flat_map(|(child_kind, table)| {
                table
                    .iter()
                    .filter(|(_, row)| {
                        row.references
                            .iter()
                            .any(|reference| reference.kind == kind && reference.id == id)
                    })
                    .map(|(child_id, _)| (*child_kind, *child_id))
            })
            .collect()
    }
}

/// Process-local relational store.
///
/// Constraints named in `relaxed` are not enforced, which lets deployments pick the
/// enrollment uniqueness rule at startup.
#[derive(Clone, Default)]
pub struct InMemorySchoolRepository {
    tables: Arc<Mutex<Tables>>,
    relaxed: Arc<BTreeSet<&'static str>>,
}

impl InMemorySchoolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relaxing<I>(constraints: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self {
            tables: Arc::default(),
            relaxed: Arc::new(constraints.into_iter().collect()),
        }
    }

    pub fn for_enrollment_uniqueness(uniqueness: EnrollmentUniqueness) -> Self {
        Self::relaxing(uniqueness.relaxed_constraints().iter().copied())
    }

    pub fn count(&self, kind: ResourceKind) -> Result<usize, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.rows.get(&kind).map_or(0, BTreeMap::len))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl SchoolRepository for InMemorySchoolRepository {
    fn insert<T: Record>(&self, mut record: T) -> Result<T, RepositoryError> {
        let mut tables = self.lock()?;
        let references = record.references();
        let unique_keys = record.unique_keys();
        tables.check_references(&references)?;
        tables.check_unique(T::KIND, None, &unique_keys, &self.relaxed)?;

        let sequence = tables.sequences.entry(T::KIND).or_insert(0);
        *sequence += 1;
        let id = EntityId(*sequence);
        record.assign_id(id);

        tables.rows.entry(T::KIND).or_default().insert(
            id,
            Row {
                value: Box::new(record.clone()),
                references,
                unique_keys,
            },
        );
        Ok(record)
    }

    fn update<T: Record>(&self, record: T) -> Result<T, RepositoryError> {
        let mut tables = self.lock()?;
        let id = record.id();
        if !tables.contains(T::KIND, id) {
            return Err(RepositoryError::NotFound);
        }

        let references = record.references();
        let unique_keys = record.unique_keys();
        tables.check_references(&references)?;
        tables.check_unique(T::KIND, Some(id), &unique_keys, &self.relaxed)?;

        tables.rows.entry(T::KIND).or_default().insert(
            id,
            Row {
                value: Box::new(record.clone()),
                references,
                unique_keys,
            },
        );
        Ok(record)
    }

    fn fetch<T: Record>(&self, id: EntityId) -> Result<Option<T>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .rows
            .get(&T::KIND)
            .and_then(|table| table.get(&id))
            .and_then(|row| row.value.downcast_ref::<T>())
            .cloned())
    }

    fn list<T: Record>(&self) -> Result<Vec<T>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .rows
            .get(&T::KIND)
            .map(|table| {
                table
                    .values()
                    .filter_map(|row| row.value.downcast_ref::<T>())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete<T: Record>(&self, id: EntityId) -> Result<usize, RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.contains(T::KIND, id) {
            return Err(RepositoryError::NotFound);
        }

        let mut pending = vec![(T::KIND, id)];
        let mut removed = 0;
        while let Some((kind, id)) = pending.pop() {
            let gone = tables
                .rows
                .get_mut(&kind)
                .and_then(|table| table.remove(&id));
            if gone.is_none() {
                continue;
            }
            removed += 1;
            pending.extend(tables.dependents_of(kind, id));
        }
        Ok(removed)
    }

    fn exists(&self, kind: ResourceKind, id: EntityId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.contains(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Parent {
        id: EntityId,
        code: String,
    }

    impl Record for Parent {
        const KIND: ResourceKind = ResourceKind::College;

        fn id(&self) -> EntityId {
            self.id
        }

        fn assign_id(&mut self, id: EntityId) {
            self.id = id;
        }

        fn unique_keys(&self) -> Vec<UniqueKey> {
            vec![UniqueKey::new("parent_code", self.code.clone())]
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Child {
        id: EntityId,
        parent: EntityId,
    }

    impl Record for Child {
        const KIND: ResourceKind = ResourceKind::Department;

        fn id(&self) -> EntityId {
            self.id
        }

        fn assign_id(&mut self, id: EntityId) {
            self.id = id;
        }

        fn references(&self) -> Vec<Reference> {
            vec![Reference::new("parent_id", ResourceKind::College, self.parent)]
        }
    }

    fn parent(code: &str) -> Parent {
        Parent {
            id: EntityId::default(),
            code: code.to_string(),
        }
    }

    #[test]
    fn assigns_sequential_ids_per_kind() {
        let repository = InMemorySchoolRepository::new();
        let first = repository.insert(parent("a")).expect("insert");
        let second = repository.insert(parent("b")).expect("insert");
        let child = repository
            .insert(Child {
                id: EntityId::default(),
                parent: first.id,
            })
            .expect("insert child");

        assert_eq!(first.id, EntityId(1));
        assert_eq!(second.id, EntityId(2));
        assert_eq!(child.id, EntityId(1));
    }

    #[test]
    fn rejects_missing_references() {
        let repository = InMemorySchoolRepository::new();
        let error = repository
            .insert(Child {
                id: EntityId::default(),
                parent: EntityId(42),
            })
            .expect_err("dangling parent rejected");

        assert_eq!(
            error,
            RepositoryError::MissingReference {
                field: "parent_id",
                kind: ResourceKind::College
            }
        );
    }

    #[test]
    fn unique_keys_conflict_except_against_self() {
        let repository = InMemorySchoolRepository::new();
        let stored = repository.insert(parent("dup")).expect("insert");

        assert_eq!(
            repository.insert(parent("dup")),
            Err(RepositoryError::Conflict {
                constraint: "parent_code"
            })
        );
        repository.update(stored).expect("self update keeps its key");
    }

    #[test]
    fn relaxed_constraints_are_not_enforced() {
        let repository = InMemorySchoolRepository::relaxing(["parent_code"]);
        repository.insert(parent("dup")).expect("insert");
        repository.insert(parent("dup")).expect("relaxed duplicate");
        assert_eq!(repository.count(ResourceKind::College), Ok(2));
    }

    #[test]
    fn delete_cascades_to_dependents() {
        let repository = InMemorySchoolRepository::new();
        let keep = repository.insert(parent("keep")).expect("insert");
        let doomed = repository.insert(parent("doomed")).expect("insert");
        for owner in [keep.id, doomed.id, doomed.id] {
            repository
                .insert(Child {
                    id: EntityId::default(),
                    parent: owner,
                })
                .expect("insert child");
        }

        let removed = repository.delete::<Parent>(doomed.id).expect("delete");

        assert_eq!(removed, 3);
        let children = repository.list::<Child>().expect("list");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].parent, keep.id);
        assert_eq!(
            repository.delete::<Parent>(doomed.id),
            Err(RepositoryError::NotFound)
        );
    }
}
