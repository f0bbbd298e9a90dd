//! Validated SQL identifiers.
//!
//! Table and column names reach the database as identifiers, never as bound
//! parameters, so every name is checked here and always rendered
//! double-quoted. Column names come straight from JSON keys and may contain
//! spaces or punctuation; the only characters refused are the ones that could
//! escape the quoting (`"`) or that no backend accepts (NUL, control
//! characters). Table names come from configuration and follow the stricter
//! unquoted-identifier shape.

use std::{borrow::Borrow, fmt};

use crate::{Error, Result};

/// PostgreSQL truncates identifiers beyond `NAMEDATALEN - 1` bytes, which
/// would make a freshly added column invisible to the next introspection.
pub const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
  /// Validate a column name taken from a record key.
  pub fn column(name: impl Into<String>) -> Result<Self> {
    let name = name.into();
    check_length(&name)?;
    if name.contains('"') {
      return Err(invalid(name, "contains a double quote"));
    }
    if name.chars().any(char::is_control) {
      return Err(invalid(name, "contains a control character"));
    }
    if name.trim().is_empty() {
      return Err(invalid(name, "is blank"));
    }
    Ok(Self(name))
  }

  /// Validate a table name: an ASCII letter or `_`, then letters, digits or
  /// `_`.
  pub fn table(name: impl Into<String>) -> Result<Self> {
    let name = name.into();
    check_length(&name)?;
    let mut chars = name.chars();
    let first_ok = chars
      .next()
      .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !first_ok {
      return Err(invalid(name, "must start with an ASCII letter or underscore"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
      return Err(invalid(
        name,
        "may only contain ASCII letters, digits and underscores",
      ));
    }
    Ok(Self(name))
  }

  /// For names known to be valid at compile time.
  pub(crate) fn from_static(name: &'static str) -> Self { Self(name.to_owned()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// The identifier as it appears in SQL text.
  pub fn quoted(&self) -> String { format!("\"{}\"", self.0) }
}

fn check_length(name: &str) -> Result<()> {
  if name.is_empty() {
    return Err(invalid(name.to_owned(), "is empty"));
  }
  if name.len() > MAX_IDENTIFIER_LEN {
    return Err(invalid(name.to_owned(), "is longer than 63 bytes"));
  }
  Ok(())
}

fn invalid(name: String, reason: &'static str) -> Error {
  Error::InvalidIdentifier { name, reason }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for Identifier {
  fn as_ref(&self) -> &str { &self.0 }
}

impl Borrow<str> for Identifier {
  fn borrow(&self) -> &str { &self.0 }
}
