//! SQL text for the statements a [`TableStore`](crate::store::TableStore)
//! runs.
//!
//! Identifiers are interpolated quoted; values never are. Backends differ
//! only in how bound parameters are spelled, see [`Placeholder`].

use crate::{Identifier, Record};

/// Bound-parameter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
  /// `?1, ?2, ...` (SQLite)
  Question,
  /// `$1, $2, ...` (PostgreSQL)
  Dollar,
}

impl Placeholder {
  fn render(self, n: usize) -> String {
    match self {
      Placeholder::Question => format!("?{n}"),
      Placeholder::Dollar => format!("${n}"),
    }
  }
}

pub fn drop_table(table: &Identifier) -> String {
  format!("DROP TABLE IF EXISTS {}", table.quoted())
}

pub fn create_table(table: &Identifier, columns: &[&Identifier]) -> String {
  let columns = columns
    .iter()
    .map(|c| format!("{} TEXT", c.quoted()))
    .collect::<Vec<_>>()
    .join(", ");
  format!("CREATE TABLE IF NOT EXISTS {} ({columns})", table.quoted())
}

pub fn add_column(table: &Identifier, column: &Identifier) -> String {
  format!("ALTER TABLE {} ADD COLUMN {} TEXT", table.quoted(), column.quoted())
}

/// `INSERT` for `record`'s own keys, in [`Record::iter`] order. Bind the
/// values in that same order. A record with no keys inserts an all-`NULL`
/// row.
pub fn insert(table: &Identifier, record: &Record, style: Placeholder) -> String {
  if record.is_empty() {
    return format!("INSERT INTO {} DEFAULT VALUES", table.quoted());
  }

  let mut columns = String::new();
  let mut params = String::new();
  for (i, key) in record.keys().enumerate() {
    if i > 0 {
      columns.push_str(", ");
      params.push_str(", ");
    }
    columns.push_str(&key.quoted());
    params.push_str(&style.render(i + 1));
  }
  format!("INSERT INTO {} ({columns}) VALUES ({params})", table.quoted())
}
