//! Domain library for the todo store.
//!
//! Holds the domain types, ports (traits), and the error definition. Keep
//! adapters and IO concerns out of this crate.

use std::fmt::{Display, Formatter};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Identifier of a todo item; the sole primary key of the table.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TodoId(String);

impl TodoId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, StoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(StoreError::InvalidId);
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TodoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TodoId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TodoId> for String {
    fn from(id: TodoId) -> Self {
        id.0
    }
}

/// Stored todo record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
    pub checked: bool,
    /// Seconds since the epoch with a microsecond fraction, e.g. `1700000000.123456`.
    pub created_at: String,
    /// Milliseconds since the epoch.
    pub updated_at: u64,
}

impl TodoItem {
    /// Create a fresh, unchecked item stamped with `now` for both timestamps.
    pub fn new(id: TodoId, text: String, now: SystemTime) -> Self {
        Self {
            id,
            text,
            checked: false,
            created_at: timestamp::epoch_seconds_string(now),
            updated_at: timestamp::epoch_millis(now),
        }
    }
}

/// Mutable fields written by an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoUpdate {
    pub text: String,
    pub checked: bool,
    pub updated_at: u64,
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Source of fresh item identifiers. Implementations must never repeat a value.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> TodoId;
}

/// Repository port for the todo table.
pub trait TodoRepository: Send + Sync {
    /// Fetch by key. A missing item is `Ok(None)`, not an error.
    fn get(&self, id: &TodoId) -> Result<Option<TodoItem>, StoreError>;
    /// Every item in the table, in no particular order.
    fn scan(&self) -> Result<Vec<TodoItem>, StoreError>;
    /// Insert a new item. Fails with `AlreadyExists` if the id is taken.
    fn put(&self, item: &TodoItem) -> Result<(), StoreError>;
    /// Rewrite the mutable fields of an existing item and return the stored record.
    fn update(&self, id: &TodoId, update: &TodoUpdate) -> Result<TodoItem, StoreError>;
    /// Remove an item. Removing a missing id succeeds.
    fn delete(&self, id: &TodoId) -> Result<(), StoreError>;
}

/// The single error kind surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid todo id: empty")]
    InvalidId,
    #[error("todo not found: {0}")]
    NotFound(TodoId),
    #[error("todo already exists: {0}")]
    AlreadyExists(TodoId),
    #[error("missing table: {0}")]
    MissingTable(String),
    #[error("malformed item: {0}")]
    MalformedItem(String),
    #[error("table {table} did not become active (last status: {status})")]
    TableNotReady { table: String, status: String },
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Return a short about/version line for binaries to print.
pub fn about() -> String {
    let pkg = env!("CARGO_PKG_NAME");
    let ver = env!("CARGO_PKG_VERSION");
    format!("{} v{}: todo domain library loaded", pkg, ver)
}

pub mod adapters;
pub mod id;
pub mod service;
pub mod timestamp;
