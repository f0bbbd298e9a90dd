//! The `TableStore` trait.
//!
//! Implemented by storage backends (`docload-store-sqlite`,
//! `docload-store-postgres`). The [`Loader`](crate::Loader) drives a store
//! through these primitives and owns the ordering between them; a store only
//! knows how to run one statement of each kind on its single connection.

use std::{collections::BTreeSet, future::Future};

use crate::{Identifier, Record};

/// A single-connection relational backend holding text-typed tables.
///
/// Values always travel as bound parameters. Identifiers are already
/// validated and must be rendered with [`Identifier::quoted`].
pub trait TableStore: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Names of the columns `table` currently has; empty if it does not exist.
  fn columns<'a>(
    &'a mut self,
    table: &'a Identifier,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + 'a;

  /// `DROP TABLE IF EXISTS`.
  fn drop_table<'a>(
    &'a mut self,
    table: &'a Identifier,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// `CREATE TABLE IF NOT EXISTS` with one nullable `TEXT` column per entry.
  fn create_table<'a>(
    &'a mut self,
    table: &'a Identifier,
    columns: &'a [&'a Identifier],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// `ALTER TABLE ... ADD COLUMN ... TEXT`.
  fn add_column<'a>(
    &'a mut self,
    table: &'a Identifier,
    column: &'a Identifier,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Open the row transaction.
  fn begin(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert `record` as one row. Columns absent from the record are left
  /// `NULL`.
  fn insert_row<'a>(
    &'a mut self,
    table: &'a Identifier,
    record: &'a Record,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn commit(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn rollback(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Release the connection.
  fn close(self) -> impl Future<Output = Result<(), Self::Error>> + Send
  where
    Self: Sized;
}
