//! [`SqliteStore`]: the SQLite implementation of [`TableStore`].

use std::{collections::BTreeSet, path::Path};

use docload_core::{
  Identifier, Record,
  sql::{self, Placeholder},
  store::TableStore,
};
use tracing::debug;

use crate::{Error, Result};

/// Applied once when a connection is opened.
const PRAGMAS: &str = "PRAGMA journal_mode = WAL;";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A loader destination backed by a single SQLite connection.
///
/// Cloning is cheap and every clone shares the same connection, including any
/// open transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a database file at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.execute_batch(PRAGMAS).await?;
    Ok(store)
  }

  /// Open a private in-memory database.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// Run one or more statements without parameters.
  pub async fn execute_batch(&self, statements: &str) -> Result<()> {
    let statements = statements.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&statements)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read every row of `table`, with values in the order of `columns`.
  #[cfg(test)]
  pub(crate) async fn select_all(
    &self,
    table: &Identifier,
    columns: &[&str],
  ) -> Result<Vec<Vec<Option<String>>>> {
    let column_list = columns
      .iter()
      .map(|c| format!("\"{c}\""))
      .collect::<Vec<_>>()
      .join(", ");
    let query =
      format!("SELECT {column_list} FROM {} ORDER BY rowid", table.quoted());
    let width = columns.len();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
          .query_map([], |row| {
            (0..width)
              .map(|i| row.get::<_, Option<String>>(i))
              .collect::<rusqlite::Result<Vec<_>>>()
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = Error;

  async fn columns(&mut self, table: &Identifier) -> Result<BTreeSet<String>> {
    let name = table.to_string();

    let columns = self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let names = stmt
          .query_map(rusqlite::params![name], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(names)
      })
      .await?;
    Ok(columns)
  }

  async fn drop_table(&mut self, table: &Identifier) -> Result<()> {
    self.execute_batch(&sql::drop_table(table)).await
  }

  async fn create_table(
    &mut self,
    table:   &Identifier,
    columns: &[&Identifier],
  ) -> Result<()> {
    self.execute_batch(&sql::create_table(table, columns)).await
  }

  async fn add_column(
    &mut self,
    table:  &Identifier,
    column: &Identifier,
  ) -> Result<()> {
    self.execute_batch(&sql::add_column(table, column)).await
  }

  async fn begin(&mut self) -> Result<()> { self.execute_batch("BEGIN").await }

  async fn insert_row(&mut self, table: &Identifier, record: &Record) -> Result<()> {
    let statement = sql::insert(table, record, Placeholder::Question);
    let values: Vec<Option<String>> =
      record.iter().map(|(_, value)| value.clone()).collect();
    debug!(%statement, "sqlite insert");

    self
      .conn
      .call(move |conn| {
        conn.execute(&statement, rusqlite::params_from_iter(values))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn commit(&mut self) -> Result<()> { self.execute_batch("COMMIT").await }

  async fn rollback(&mut self) -> Result<()> {
    self.execute_batch("ROLLBACK").await
  }

  async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }
}
