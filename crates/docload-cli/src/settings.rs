//! Layered configuration for the `docload` binary.
//!
//! Precedence, lowest first: built-in defaults, the optional TOML file,
//! `DOCLOAD_*` environment variables, command-line flags.

use std::path::Path;

use anyhow::{Context as _, bail};
use docload_core::{DEFAULT_TABLE, Identifier};
use serde::Deserialize;

/// Raw settings as deserialised from all sources.
#[derive(Debug, Deserialize)]
struct Settings {
  database_url: Option<String>,
  table:        String,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
  pub database_url: Option<String>,
  pub table:        Option<String>,
}

/// Fully resolved and validated configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
  pub database_url: String,
  pub table:        Identifier,
}

impl LoaderConfig {
  /// Resolve configuration from `file`, the process environment and
  /// `overrides`.
  pub fn load(file: &Path, overrides: Overrides) -> anyhow::Result<Self> {
    Self::resolve(file, None, overrides)
  }

  /// Like [`LoaderConfig::load`], reading environment variables from `env`
  /// instead of the process when it is `Some`.
  pub fn resolve(
    file: &Path,
    env: Option<config::Map<String, String>>,
    overrides: Overrides,
  ) -> anyhow::Result<Self> {
    let settings: Settings = config::Config::builder()
      .set_default("table", DEFAULT_TABLE)?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("DOCLOAD").source(env))
      .set_override_option("database_url", overrides.database_url)?
      .set_override_option("table", overrides.table)?
      .build()
      .with_context(|| format!("failed to read configuration from {}", file.display()))?
      .try_deserialize()
      .context("failed to deserialise configuration")?;

    let Some(database_url) = settings.database_url.filter(|u| !u.trim().is_empty())
    else {
      bail!(
        "no database URL configured; set DOCLOAD_DATABASE_URL, add \
         `database_url` to the config file, or pass --database-url"
      );
    };

    let table = Identifier::table(settings.table).context("invalid table name")?;

    Ok(Self { database_url, table })
  }
}
