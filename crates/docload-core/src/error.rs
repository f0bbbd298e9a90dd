//! Error types for `docload-core`.

use std::fmt;

use thiserror::Error;

/// A backend error, boxed so the loader stays independent of any driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The schema statement that was running when a [`Error::Schema`] occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStep {
  Drop,
  Create,
  Introspect,
  AddColumn,
}

impl fmt::Display for SchemaStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      SchemaStep::Drop => "dropping table",
      SchemaStep::Create => "creating table",
      SchemaStep::Introspect => "reading table columns",
      SchemaStep::AddColumn => "adding column",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("connection error: {0}")]
  Connection(#[source] BoxError),

  #[error("parse error: {0}")]
  Parse(String),

  #[error("invalid identifier {name:?}: {reason}")]
  InvalidIdentifier { name: String, reason: &'static str },

  #[error("schema error on table {table} while {step}: {source}")]
  Schema {
    table:  String,
    step:   SchemaStep,
    #[source]
    source: BoxError,
  },

  #[error("insert error at row {row}: {source}")]
  Insert {
    row:    usize,
    #[source]
    source: BoxError,
  },

  /// Opening or committing the row transaction failed.
  #[error("transaction error: {0}")]
  Transaction(#[source] BoxError),
}

impl Error {
  /// Wrap a backend error raised while connecting.
  pub fn connection(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Connection(Box::new(e))
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self { Error::Parse(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
