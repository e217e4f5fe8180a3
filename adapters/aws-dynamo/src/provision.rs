//! Idempotent creation of the todo table.
//!
//! Used by integration tests and the `todo-provision` binary; the runtime CRUD
//! path never creates tables.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, KeySchemaElement, KeyType, ProvisionedThroughput, ScalarAttributeType,
    TableStatus,
};
use aws_sdk_dynamodb::Client;
use domain::StoreError;
use tracing::{debug, info};

use crate::item::ATTR_ID;
use crate::{map_sdk_err, DynamoRepo};

/// Throughput and polling settings for [`DynamoRepo::provision_table_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionOptions {
    pub read_capacity: i64,
    pub write_capacity: i64,
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            read_capacity: 1,
            write_capacity: 1,
            poll_interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

impl DynamoRepo {
    /// Create the table if missing and wait until it is `ACTIVE`.
    pub fn provision_table(&self) -> Result<TableStatus, StoreError> {
        self.provision_table_with(&ProvisionOptions::default())
    }

    /// Like [`provision_table`](Self::provision_table) with explicit settings.
    ///
    /// Returns `StoreError::TableNotReady` if the table is not active after
    /// `max_attempts` polls.
    pub fn provision_table_with(&self, opts: &ProvisionOptions) -> Result<TableStatus, StoreError> {
        let table = self.table_name().to_string();
        self.block_on(async {
            match describe_status(self.client(), &table).await? {
                Some(status) => {
                    debug!(table = %table, status = %status.as_str(), "table already exists");
                }
                None => create_table(self.client(), &table, opts).await?,
            }
            wait_for_active(self.client(), &table, opts).await
        })?
    }
}

/// Current table status, or `None` if the table does not exist.
async fn describe_status(client: &Client, table: &str) -> Result<Option<TableStatus>, StoreError> {
    match client.describe_table().table_name(table).send().await {
        Ok(out) => Ok(out.table().and_then(|t| t.table_status()).cloned()),
        Err(e) => {
            if e
                .as_service_error()
                .is_some_and(|se| se.is_resource_not_found_exception())
            {
                Ok(None)
            } else {
                Err(map_sdk_err(table, e))
            }
        }
    }
}

async fn create_table(client: &Client, table: &str, opts: &ProvisionOptions) -> Result<(), StoreError> {
    let key_schema = KeySchemaElement::builder()
        .attribute_name(ATTR_ID)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    let attribute_definition = AttributeDefinition::builder()
        .attribute_name(ATTR_ID)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    let throughput = ProvisionedThroughput::builder()
        .read_capacity_units(opts.read_capacity)
        .write_capacity_units(opts.write_capacity)
        .build()
        .map_err(|e| StoreError::Backend(e.to_string()))?;

    let res = client
        .create_table()
        .table_name(table)
        .key_schema(key_schema)
        .attribute_definitions(attribute_definition)
        .provisioned_throughput(throughput)
        .send()
        .await;
    match res {
        Ok(_) => {
            info!(table = %table, "created table");
            Ok(())
        }
        // Someone else created it between describe and create
        Err(e) if e
            .as_service_error()
            .is_some_and(|se| se.is_resource_in_use_exception()) =>
        {
            debug!(table = %table, "table creation already in progress");
            Ok(())
        }
        Err(e) => Err(map_sdk_err(table, e)),
    }
}

async fn wait_for_active(
    client: &Client,
    table: &str,
    opts: &ProvisionOptions,
) -> Result<TableStatus, StoreError> {
    // Always poll at least once
    let max_attempts = opts.max_attempts.max(1);
    let mut last: Option<TableStatus> = None;
    for attempt in 1..=max_attempts {
        last = describe_status(client, table).await?;
        if last == Some(TableStatus::Active) {
            info!(table = %table, attempt, "table is active");
            return Ok(TableStatus::Active);
        }
        debug!(table = %table, attempt, status = ?last, "waiting for table");
        if attempt < max_attempts {
            tokio::time::sleep(opts.poll_interval).await;
        }
    }
    Err(StoreError::TableNotReady {
        table: table.to_string(),
        status: last
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "MISSING".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_minimal_throughput() {
        let opts = ProvisionOptions::default();
        assert_eq!(opts.read_capacity, 1);
        assert_eq!(opts.write_capacity, 1);
        assert!(opts.max_attempts > 0);
    }
}
