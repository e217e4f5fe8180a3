//! Item identifier strategies.

#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::{IdGenerator, TodoId};

/// Time-ordered UUID v7 identifiers. The default for real tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidV7Generator;

impl UuidV7Generator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> TodoId {
        // Hyphenated UUIDs are never empty
        TodoId(Uuid::now_v7().to_string())
    }
}

/// Deterministic `<prefix>-<n>` identifiers for unit tests.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

#[cfg(test)]
impl SequentialIdGenerator {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

#[cfg(test)]
impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> TodoId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        TodoId(format!("{}-{}", self.prefix, n))
    }
}
