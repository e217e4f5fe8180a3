//! Environment configuration and client construction.
//!
//! The endpoint override is an explicit field consumed by [`load_client`];
//! nothing here mutates process-wide SDK state.

use aws_sdk_dynamodb::Client;

pub const ENV_TABLE: &str = "DYNAMODB_TABLE";
pub const ENV_ENDPOINT_OVERRIDE: &str = "ENDPOINT_OVERRIDE";
pub const ENV_REGION: &str = "AWS_REGION";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Where the todo table lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamoConfig {
    pub table_name: String,
    /// Alternate service endpoint, e.g. DynamoDB Local for tests.
    pub endpoint_override: Option<String>,
    pub region: Option<String>,
}

impl DynamoConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            endpoint_override: None,
            region: None,
        }
    }

    /// Build from environment variables:
    /// - `DYNAMODB_TABLE` (required)
    /// - `ENDPOINT_OVERRIDE` (optional; empty means unset)
    /// - `AWS_REGION` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let table_name = non_empty(ENV_TABLE).ok_or(ConfigError::Missing(ENV_TABLE))?;
        Ok(Self {
            table_name,
            endpoint_override: non_empty(ENV_ENDPOINT_OVERRIDE),
            region: non_empty(ENV_REGION),
        })
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_override {
            Some(url) => format!("table {} at {}", self.table_name, url),
            None => format!("table {} on AWS DynamoDB", self.table_name),
        }
    }
}

/// Creates a DynamoDB client, honoring the endpoint override and region.
pub async fn load_client(config: &DynamoConfig) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint_override {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;
    Client::new(&sdk_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn table_is_required() {
        let err = DynamoConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_TABLE)));

        let err = DynamoConfig::from_lookup(lookup(&[(ENV_TABLE, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_TABLE)));
    }

    #[test]
    fn endpoint_override_is_optional() {
        let cfg = DynamoConfig::from_lookup(lookup(&[(ENV_TABLE, "todos")])).unwrap();
        assert_eq!(cfg, DynamoConfig::new("todos"));

        let cfg = DynamoConfig::from_lookup(lookup(&[
            (ENV_TABLE, "todos"),
            (ENV_ENDPOINT_OVERRIDE, ""),
        ]))
        .unwrap();
        assert_eq!(cfg.endpoint_override, None);
    }

    #[test]
    fn reads_all_fields() {
        let cfg = DynamoConfig::from_lookup(lookup(&[
            (ENV_TABLE, "todos"),
            (ENV_ENDPOINT_OVERRIDE, "http://localhost:8000"),
            (ENV_REGION, "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(
            cfg,
            DynamoConfig {
                table_name: "todos".into(),
                endpoint_override: Some("http://localhost:8000".into()),
                region: Some("eu-west-1".into()),
            }
        );
        assert_eq!(cfg.target_display(), "table todos at http://localhost:8000");
    }
}
