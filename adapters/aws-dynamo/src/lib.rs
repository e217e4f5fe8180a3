//! DynamoDB adapter implementing the `TodoRepository` port.
//!
//! - Stores todos in a single table with primary (hash) key `id`.
//! - Built from a [`DynamoConfig`], normally `DynamoConfig::from_env()` reading
//!   `DYNAMODB_TABLE` and the optional `ENDPOINT_OVERRIDE`.
//! - Provides idempotent table provisioning for tests and bootstrap (see
//!   [`provision`]).
//!
//! Notes:
//! - The domain `TodoRepository` trait is synchronous. We bridge to the async AWS
//!   SDK using an internal `tokio::runtime::Runtime` and `block_on`, or the
//!   caller's multi-thread runtime via `block_in_place`.

pub mod config;
mod item;
pub mod provision;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use domain::{StoreError, TodoId, TodoItem, TodoRepository, TodoUpdate};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::{debug, error, info, warn};

pub use config::{ConfigError, DynamoConfig};
pub use provision::ProvisionOptions;

use item::{item_to_todo, key_value, todo_to_item, ATTR_ID};

/// Repository backed by AWS DynamoDB.
///
/// Supports both standalone mode (creates its own Tokio runtime) and async
/// callers on a multi-thread runtime (reuses it via `block_in_place`). A
/// current-thread runtime cannot block, so calls made from one fail with
/// `StoreError::Backend` instead of panicking.
#[derive(Clone)]
pub struct DynamoRepo {
    table: String,
    client: Client,
    bridge: Bridge,
}

/// Where the SDK futures are driven.
#[derive(Clone)]
enum Bridge {
    /// Built outside any runtime
    Owned(Arc<OwnedRuntime>),
    /// Built inside a multi-thread runtime
    Shared(Handle),
}

/// Owned runtime that may be dropped from async code without panicking.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(rt) = self.0.take() {
            rt.shutdown_background();
        }
    }
}

impl DynamoRepo {
    /// Create a new repo from a table name and an AWS SDK client.
    pub fn with_client(table: impl Into<String>, client: Client) -> Result<Self, StoreError> {
        let bridge = Self::maybe_create_runtime()?;
        Ok(Self {
            table: table.into(),
            client,
            bridge,
        })
    }

    /// Build the SDK client from `config`, honoring its endpoint override.
    pub fn new(config: &DynamoConfig) -> Result<Self, StoreError> {
        let bridge = Self::maybe_create_runtime()?;
        let client = Self::block_on_with(&bridge, config::load_client(config))?;
        info!(target_env = %config.target_display(), "dynamo client ready");
        Ok(Self {
            table: config.table_name.clone(),
            client,
            bridge,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Reuse the current runtime if there is one, otherwise create our own.
    fn maybe_create_runtime() -> Result<Bridge, StoreError> {
        match Handle::try_current() {
            Ok(handle) => {
                ensure_can_block(&handle)?;
                Ok(Bridge::Shared(handle))
            }
            Err(_) => {
                let rt = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                    .map_err(|e| StoreError::Backend(format!("tokio runtime init: {e}")))?;
                Ok(Bridge::Owned(Arc::new(OwnedRuntime(Some(rt)))))
            }
        }
    }

    /// Run an async future to completion on the repo's runtime.
    fn block_on<F: Future>(&self, fut: F) -> Result<F::Output, StoreError> {
        Self::block_on_with(&self.bridge, fut)
    }

    fn block_on_with<F: Future>(bridge: &Bridge, fut: F) -> Result<F::Output, StoreError> {
        let run = || match bridge {
            Bridge::Owned(rt) => match &rt.0 {
                Some(rt) => Ok(rt.block_on(fut)),
                None => Err(StoreError::Backend("tokio runtime already shut down".into())),
            },
            Bridge::Shared(handle) => Ok(handle.block_on(fut)),
        };
        match Handle::try_current() {
            Ok(current) => {
                ensure_can_block(&current)?;
                tokio::task::block_in_place(run)
            }
            Err(_) => run(),
        }
    }

    fn map_sdk_err<E: ProvideErrorMetadata + std::error::Error>(&self, op: &str, e: E) -> StoreError {
        let err = map_sdk_err(&self.table, e);
        error!(table = %self.table, op, err = %err, "dynamo request failed");
        err
    }
}

impl TodoRepository for DynamoRepo {
    fn get(&self, id: &TodoId) -> Result<Option<TodoItem>, StoreError> {
        debug!(table = %self.table, id = %id, "get_item");
        let fut = async {
            self.client
                .get_item()
                .table_name(&self.table)
                .key(ATTR_ID, key_value(id))
                .consistent_read(true)
                .send()
                .await
        };
        let out = self.block_on(fut)?.map_err(|e| self.map_sdk_err("get_item", e))?;
        match out.item() {
            Some(item) => Ok(Some(item_to_todo(item)?)),
            None => Ok(None),
        }
    }

    fn scan(&self) -> Result<Vec<TodoItem>, StoreError> {
        debug!(table = %self.table, "scan");
        let mut res = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0usize;
        loop {
            let fut = async {
                self.client
                    .scan()
                    .table_name(&self.table)
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
            };
            let out = self.block_on(fut)?.map_err(|e| self.map_sdk_err("scan", e))?;
            pages += 1;
            for it in out.items() {
                match item_to_todo(it) {
                    Ok(todo) => res.push(todo),
                    Err(e) => warn!(table = %self.table, err = %e, "skipping malformed item"),
                }
            }
            match out.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        debug!(table = %self.table, pages, count = res.len(), "scan done");
        Ok(res)
    }

    fn put(&self, todo: &TodoItem) -> Result<(), StoreError> {
        // Conditional put so a colliding id never overwrites an existing item
        let item = todo_to_item(todo);
        let fut = async {
            self.client
                .put_item()
                .table_name(&self.table)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(#id)")
                .expression_attribute_names("#id", ATTR_ID)
                .send()
                .await
        };
        self.block_on(fut)?.map_err(|e| match e.as_service_error() {
            Some(se) if se.is_conditional_check_failed_exception() => {
                StoreError::AlreadyExists(todo.id.clone())
            }
            _ => self.map_sdk_err("put_item", e),
        })?;
        info!(table = %self.table, id = %todo.id, "inserted item");
        Ok(())
    }

    fn update(&self, id: &TodoId, update: &TodoUpdate) -> Result<TodoItem, StoreError> {
        let fut = async {
            self.client
                .update_item()
                .table_name(&self.table)
                .key(ATTR_ID, key_value(id))
                .update_expression(
                    "SET #todo_text = :text, checked = :checked, updatedAt = :updatedAt",
                )
                .expression_attribute_names("#todo_text", "text")
                .expression_attribute_names("#id", ATTR_ID)
                .expression_attribute_values(":text", AttributeValue::S(update.text.clone()))
                .expression_attribute_values(":checked", AttributeValue::Bool(update.checked))
                .expression_attribute_values(
                    ":updatedAt",
                    AttributeValue::N(update.updated_at.to_string()),
                )
                .condition_expression("attribute_exists(#id)")
                .return_values(ReturnValue::AllNew)
                .send()
                .await
        };
        let out = self.block_on(fut)?.map_err(|e| match e.as_service_error() {
            Some(se) if se.is_conditional_check_failed_exception() => {
                StoreError::NotFound(id.clone())
            }
            _ => self.map_sdk_err("update_item", e),
        })?;
        let attrs = out
            .attributes()
            .ok_or_else(|| StoreError::MalformedItem("update returned no attributes".into()))?;
        let todo = item_to_todo(attrs)?;
        info!(table = %self.table, id = %id, checked = todo.checked, "updated item");
        Ok(todo)
    }

    fn delete(&self, id: &TodoId) -> Result<(), StoreError> {
        let fut = async {
            self.client
                .delete_item()
                .table_name(&self.table)
                .key(ATTR_ID, key_value(id))
                .send()
                .await
        };
        self.block_on(fut)?.map_err(|e| self.map_sdk_err("delete_item", e))?;
        info!(table = %self.table, id = %id, "removed item");
        Ok(())
    }
}

/// `block_in_place` panics on a current-thread runtime.
fn ensure_can_block(handle: &Handle) -> Result<(), StoreError> {
    match handle.runtime_flavor() {
        RuntimeFlavor::MultiThread => Ok(()),
        flavor => Err(StoreError::Backend(format!(
            "DynamoRepo requires a multi-thread tokio runtime, called from {flavor:?}"
        ))),
    }
}

fn map_sdk_err<E: ProvideErrorMetadata + std::error::Error>(table: &str, e: E) -> StoreError {
    if e.code() == Some("ResourceNotFoundException") {
        return StoreError::MissingTable(table.to_string());
    }
    StoreError::Backend(format!("dynamo error: {}", DisplayErrorContext(&e)))
}
