//! `docload`: load a JSON batch from stdin into a dynamically shaped table.
//!
//! # Usage
//!
//! ```
//! classify-documents | DOCLOAD_DATABASE_URL=postgres://… docload
//! docload --database-url sqlite://local.db --table invoices --input batch.json
//! ```
//!
//! Progress is logged to stdout; a failed batch is reported on stderr and the
//! connection is still closed before the process exits.

mod settings;
mod target;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use docload_core::{Identifier, LoadReport, Loader, store::TableStore};
use docload_store_postgres::PgStore;
use docload_store_sqlite::SqliteStore;
use tokio::io::{AsyncRead, AsyncReadExt as _};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  settings::{LoaderConfig, Overrides},
  target::Target,
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Load classified JSON records into a database table")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "docload.toml")]
  config: PathBuf,

  /// Database URL (postgres://, postgresql:// or sqlite:).
  #[arg(long)]
  database_url: Option<String>,

  /// Destination table (default: documents).
  #[arg(long)]
  table: Option<String>,

  /// Read the batch from this file instead of stdin.
  #[arg(short, long, value_name = "FILE")]
  input: Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = LoaderConfig::load(&cli.config, Overrides {
    database_url: cli.database_url,
    table:        cli.table,
  })?;

  let input = cli.input.as_deref();
  let outcome = match Target::parse(&cfg.database_url)? {
    Target::Postgres(url) => {
      let store = PgStore::connect(&url)
        .await
        .map_err(docload_core::Error::connection)
        .context("failed to connect to postgres")?;
      session(store, cfg.table, input).await
    }
    Target::SqliteMemory => {
      let store = SqliteStore::open_in_memory()
        .await
        .map_err(docload_core::Error::connection)
        .context("failed to open in-memory sqlite database")?;
      session(store, cfg.table, input).await
    }
    Target::SqliteFile(path) => {
      let store = SqliteStore::open(&path)
        .await
        .map_err(docload_core::Error::connection)
        .with_context(|| format!("failed to open sqlite database {}", path.display()))?;
      session(store, cfg.table, input).await
    }
  };

  if let Err(e) = outcome {
    eprintln!("Error reading or inserting data: {e:#}");
  }

  Ok(())
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// Read the batch from `input` (stdin when `None`) and load it.
async fn session<S: TableStore>(
  store: S,
  table: Identifier,
  input: Option<&Path>,
) -> anyhow::Result<LoadReport> {
  match input {
    Some(path) => match tokio::fs::File::open(path).await {
      Ok(file) => run(store, table, file).await,
      Err(e) => {
        close(store).await;
        Err(e).with_context(|| format!("failed to open {}", path.display()))
      }
    },
    None => run(store, table, tokio::io::stdin()).await,
  }
}

/// Load one batch read from `reader`, then close the connection whatever the
/// outcome.
async fn run<S, R>(store: S, table: Identifier, mut reader: R) -> anyhow::Result<LoadReport>
where
  S: TableStore,
  R: AsyncRead + Unpin,
{
  let mut loader = Loader::with_table(store, table);

  let outcome = async {
    let mut text = String::new();
    reader
      .read_to_string(&mut text)
      .await
      .context("failed to read input")?;
    let report = loader.load_json(&text).await?;
    Ok::<_, anyhow::Error>(report)
  }
  .await;

  close(loader.into_store()).await;

  if let Ok(report) = &outcome {
    tracing::info!(
      table = %report.table,
      rows = report.rows_inserted,
      added_columns = report.added_columns.len(),
      "load finished"
    );
  }
  outcome
}

async fn close<S: TableStore>(store: S) {
  if let Err(e) = store.close().await {
    tracing::warn!(error = %e, "failed to close database connection");
  } else {
    tracing::debug!("database connection closed");
  }
}

#[cfg(test)]
mod tests {
  use docload_core::Error;

  use super::*;

  fn documents() -> Identifier { Identifier::table("documents").unwrap() }

  async fn store() -> SqliteStore { SqliteStore::open_in_memory().await.unwrap() }

  #[tokio::test]
  async fn run_loads_batch_from_reader() {
    let input: &[u8] = br#"[{"a":"1","b":"2"},{"a":"3","c":"4"}]"#;
    let report = run(store().await, documents(), input).await.unwrap();
    assert_eq!(report.rows_inserted, 2);
    assert!(report.dropped);
  }

  #[tokio::test]
  async fn run_treats_empty_input_as_no_op() {
    let input: &[u8] = b"";
    let report = run(store().await, documents(), input).await.unwrap();
    assert_eq!(report.rows_inserted, 0);
    assert!(!report.dropped);
  }

  #[tokio::test]
  async fn run_reports_parse_errors() {
    let input: &[u8] = b"{not json";
    let err = run(store().await, documents(), input).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Parse(_))));
  }

  #[tokio::test]
  async fn run_rejects_invalid_utf8() {
    let input: &[u8] = &[0xff, 0xfe, b'[', b']'];
    let err = run(store().await, documents(), input).await.unwrap_err();
    assert!(err.to_string().contains("failed to read input"), "{err}");
  }

  #[tokio::test]
  async fn session_reports_missing_input_file() {
    let err = session(
      store().await,
      documents(),
      Some(Path::new("/nonexistent/batch.json")),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("failed to open"), "{err}");
  }
}
