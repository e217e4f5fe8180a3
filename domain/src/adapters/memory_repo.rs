use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{StoreError, TodoId, TodoItem, TodoRepository, TodoUpdate};

/// Simple in-memory repository for tests. Not thread-safe for high concurrency
/// beyond the internal mutex guarding the map.
pub struct InMemoryRepo {
    inner: Mutex<BTreeMap<TodoId, TodoItem>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoRepository for InMemoryRepo {
    fn get(&self, id: &TodoId) -> Result<Option<TodoItem>, StoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("mutex poisoned".into()))?;
        Ok(map.get(id).cloned())
    }

    fn scan(&self) -> Result<Vec<TodoItem>, StoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("mutex poisoned".into()))?;
        Ok(map.values().cloned().collect())
    }

    fn put(&self, item: &TodoItem) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("mutex poisoned".into()))?;
        if map.contains_key(&item.id) {
            return Err(StoreError::AlreadyExists(item.id.clone()));
        }
        map.insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn update(&self, id: &TodoId, update: &TodoUpdate) -> Result<TodoItem, StoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("mutex poisoned".into()))?;
        match map.get_mut(id) {
            Some(item) => {
                item.text = update.text.clone();
                item.checked = update.checked;
                item.updated_at = update.updated_at;
                Ok(item.clone())
            }
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| StoreError::Backend("mutex poisoned".into()))?;
        map.remove(id);
        Ok(())
    }
}
