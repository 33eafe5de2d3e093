//! # agora-admin
//!
//! Operator tool for an agora store. It opens the database named by the
//! environment (applying any pending migrations on the way) and prints a
//! JSON summary of what the store holds.
//!
//! Configuration is read from `AGORA_DB_PATH` and `AGORA_BUSY_TIMEOUT_MS`;
//! log verbosity follows `RUST_LOG`.

use agora_store::migrations::schema_version;
use agora_store::{Database, StoreConfig};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_store=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting agora-admin v{}", env!("CARGO_PKG_VERSION"));

    let config = StoreConfig::from_env();
    info!(?config, "Loaded configuration");

    let db = Database::open(&config).context("failed to open the forum database")?;
    let version = schema_version(db.conn())?;
    let status = db.status().context("failed to read store counters")?;

    info!(
        schema_version = version,
        users = status.user,
        forums = status.forum,
        threads = status.thread,
        posts = status.post,
        "Store ready"
    );

    let summary = serde_json::json!({
        "path": db.path(),
        "schemaVersion": version,
        "status": status,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
