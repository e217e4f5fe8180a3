//! todo-provision — create the todo table and wait until it is ready.
//!
//! Run:
//! ```bash
//! # against DynamoDB Local
//! DYNAMODB_TABLE=todos ENDPOINT_OVERRIDE=http://localhost:8000 \
//!   cargo run -p todo-provision
//! ```
//!
//! Exits non-zero if configuration is invalid or the table does not become
//! active. Configuration: see `config.rs`.

mod config;

use std::process;

use aws_dynamo::DynamoRepo;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset: our crates at info, SDK internals
/// only when they warn.
const DEFAULT_FILTER: &str = "warn,todo_provision=info,aws_dynamo=info";

/// Logs go to stderr; json for machine consumers, compact lines otherwise.
fn init_tracing(format: &config::LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = *format == config::LogFormat::Json;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| {
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr)
        }))
        .init();
}

fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    init_tracing(&cfg.log_format);
    info!(about = %domain::about(), target_env = %cfg.dynamo.target_display(), "provisioning");

    let repo = match DynamoRepo::new(&cfg.dynamo) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, "dynamo init error");
            process::exit(1);
        }
    };

    match repo.provision_table_with(&cfg.provision) {
        Ok(status) => info!(table = %repo.table_name(), status = %status.as_str(), "table ready"),
        Err(e) => {
            error!(table = %repo.table_name(), err = %e, "provisioning failed");
            process::exit(1);
        }
    }
}
