use crate::timestamp::epoch_millis;
use crate::{Clock, IdGenerator, StoreError, TodoId, TodoItem, TodoRepository, TodoUpdate};

/// Application facade over the todo table.
///
/// Generic over repository, id generator, and clock so the same code runs
/// against DynamoDB in production and the in-memory repository in tests.
/// Every operation is one independent round trip to the repository.
pub struct TodoStore<R: TodoRepository, G: IdGenerator, C: Clock> {
    repo: R,
    ids: G,
    clock: C,
}

impl<R: TodoRepository, G: IdGenerator, C: Clock> TodoStore<R, G, C> {
    pub fn new(repo: R, ids: G, clock: C) -> Self {
        Self { repo, ids, clock }
    }

    /// Access the underlying repository (e.g. to provision its table).
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Fetch a single item. `Ok(None)` when no item has this id.
    pub fn get_item(&self, id: &TodoId) -> Result<Option<TodoItem>, StoreError> {
        self.repo.get(id)
    }

    /// Every item currently in the table, order unspecified.
    pub fn get_items(&self) -> Result<Vec<TodoItem>, StoreError> {
        self.repo.scan()
    }

    /// Create a new unchecked item with a store-assigned id.
    pub fn put_item(&self, text: impl Into<String>) -> Result<TodoItem, StoreError> {
        let item = TodoItem::new(self.ids.next_id(), text.into(), self.clock.now());
        self.repo.put(&item)?;
        Ok(item)
    }

    /// Rewrite `text` and `checked` and refresh `updatedAt`.
    ///
    /// Fails with `StoreError::NotFound` if the id does not exist; updates never
    /// create items.
    pub fn update_item(
        &self,
        id: &TodoId,
        text: impl Into<String>,
        checked: bool,
    ) -> Result<TodoItem, StoreError> {
        let update = TodoUpdate {
            text: text.into(),
            checked,
            updated_at: epoch_millis(self.clock.now()),
        };
        self.repo.update(id, &update)
    }

    /// Remove an item. Deleting a missing id is not an error.
    pub fn delete_item(&self, id: &TodoId) -> Result<(), StoreError> {
        self.repo.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_repo::InMemoryRepo;
    use crate::id::{SequentialIdGenerator, UuidV7Generator};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Clock that advances one second per reading.
    struct TickingClock(AtomicU64);

    impl TickingClock {
        fn new() -> Self {
            Self(AtomicU64::new(1_700_000_000))
        }
    }

    impl Clock for TickingClock {
        fn now(&self) -> SystemTime {
            UNIX_EPOCH + Duration::from_secs(self.0.fetch_add(1, Ordering::Relaxed))
        }
    }

    struct UnreachableRepo;

    impl TodoRepository for UnreachableRepo {
        fn get(&self, _id: &TodoId) -> Result<Option<TodoItem>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        fn scan(&self) -> Result<Vec<TodoItem>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        fn put(&self, _item: &TodoItem) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        fn update(&self, _id: &TodoId, _update: &TodoUpdate) -> Result<TodoItem, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        fn delete(&self, _id: &TodoId) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    fn store() -> TodoStore<InMemoryRepo, SequentialIdGenerator, TickingClock> {
        TodoStore::new(
            InMemoryRepo::new(),
            SequentialIdGenerator::new("todo"),
            TickingClock::new(),
        )
    }

    #[test]
    fn put_then_get_returns_same_record() {
        let svc = store();
        let created = svc.put_item("Aprender DevOps y Cloud en la UNIR").unwrap();
        assert!(!created.checked);
        let loaded = svc.get_item(&created.id).unwrap().expect("stored");
        assert_eq!(loaded, created);
    }

    #[test]
    fn put_assigns_unique_ids() {
        let svc = TodoStore::new(InMemoryRepo::new(), UuidV7Generator::new(), TickingClock::new());
        let ids: HashSet<_> = (0..50)
            .map(|i| svc.put_item(format!("item {i}")).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn update_rewrites_mutable_fields_only() {
        let svc = store();
        let created = svc.put_item("first").unwrap();
        let updated = svc.update_item(&created.id, "second", true).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.text, "second");
        assert!(updated.checked);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(svc.get_item(&created.id).unwrap(), Some(updated));
    }

    #[test]
    fn update_missing_item_is_not_found() {
        let svc = store();
        let missing = TodoId::new("nope").unwrap();
        let err = svc.update_item(&missing, "x", false).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == missing));
        assert!(svc.get_items().unwrap().is_empty());
    }

    #[test]
    fn delete_then_get_is_absent_and_delete_is_idempotent() {
        let svc = store();
        let created = svc.put_item("temp").unwrap();
        svc.delete_item(&created.id).unwrap();
        assert_eq!(svc.get_item(&created.id).unwrap(), None);
        svc.delete_item(&created.id).unwrap();
    }

    #[test]
    fn get_items_returns_every_created_item_once() {
        let svc = store();
        let created: HashSet<_> = (0..5)
            .map(|i| svc.put_item(format!("t{i}")).unwrap().id)
            .collect();
        let listed = svc.get_items().unwrap();
        let listed_ids: HashSet<_> = listed.iter().map(|t| t.id.clone()).collect();
        assert_eq!(listed.len(), listed_ids.len());
        assert!(created.is_subset(&listed_ids));
    }

    #[test]
    fn unreachable_store_surfaces_errors() {
        let svc = TodoStore::new(UnreachableRepo, SequentialIdGenerator::new("t"), TickingClock::new());
        let id = TodoId::new("x").unwrap();
        assert!(matches!(svc.get_item(&id), Err(StoreError::Backend(_))));
        assert!(matches!(svc.get_items(), Err(StoreError::Backend(_))));
        assert!(matches!(svc.put_item("x"), Err(StoreError::Backend(_))));
        assert!(matches!(svc.update_item(&id, "x", true), Err(StoreError::Backend(_))));
        assert!(matches!(svc.delete_item(&id), Err(StoreError::Backend(_))));
    }
}
