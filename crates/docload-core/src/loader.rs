//! [`Loader`]: the dynamic loader session.
//!
//! A `Loader` owns one [`TableStore`] connection, the destination table name,
//! and the "has dropped" flag. The first batch loaded through a session drops
//! and recreates the table; every later batch only extends it.
//! Construct one `Loader` per process (or per logical run) and feed it every
//! batch.

use tracing::{debug, info, warn};

use crate::{
  Error, Identifier, Record, Result, SchemaStep,
  record::{key_union, parse_batch},
  store::TableStore,
};

/// Destination table used when none is configured.
pub const DEFAULT_TABLE: &str = "documents";

/// The outcome of one successful [`Loader::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
  pub table:         Identifier,
  /// Whether this batch ran the once-per-session drop.
  pub dropped:       bool,
  /// Columns added to an existing table by `ALTER TABLE`.
  pub added_columns: Vec<Identifier>,
  pub rows_inserted: usize,
}

impl LoadReport {
  fn empty(table: Identifier) -> Self {
    Self { table, dropped: false, added_columns: Vec::new(), rows_inserted: 0 }
  }
}

pub struct Loader<S> {
  store:   S,
  table:   Identifier,
  dropped: bool,
}

impl<S: TableStore> Loader<S> {
  /// A session writing to [`DEFAULT_TABLE`].
  pub fn new(store: S) -> Self {
    Self::with_table(store, Identifier::from_static(DEFAULT_TABLE))
  }

  pub fn with_table(store: S, table: Identifier) -> Self {
    Self { store, table, dropped: false }
  }

  pub fn table(&self) -> &Identifier { &self.table }

  /// True once this session has dropped the destination table.
  pub fn has_dropped(&self) -> bool { self.dropped }

  pub fn store_mut(&mut self) -> &mut S { &mut self.store }

  /// End the session and hand the connection back, typically to close it.
  pub fn into_store(self) -> S { self.store }

  /// Parse `text` with [`parse_batch`] and load the result. Empty or
  /// whitespace-only input is a no-op.
  pub async fn load_json(&mut self, text: &str) -> Result<LoadReport> {
    match parse_batch(text)? {
      Some(records) => self.load(&records).await,
      None => {
        info!("input is empty; nothing to load");
        Ok(LoadReport::empty(self.table.clone()))
      }
    }
  }

  /// Reconcile the table schema with `records` and insert them as one
  /// transaction.
  ///
  /// Schema changes (drop, create, add column) run before the row transaction
  /// and are not undone if an insert fails. Rows are all-or-nothing.
  pub async fn load(&mut self, records: &[Record]) -> Result<LoadReport> {
    let mut report = LoadReport::empty(self.table.clone());
    let Self { store, table, dropped } = self;
    let table = &*table;

    if !*dropped {
      info!(%table, "dropping table if it exists");
      store
        .drop_table(table)
        .await
        .map_err(|e| schema_error(table, SchemaStep::Drop, e))?;
      info!(%table, "table dropped (or did not exist)");
      *dropped = true;
      report.dropped = true;
    }

    let all_keys: Vec<&Identifier> = key_union(records).into_iter().collect();
    if all_keys.is_empty() {
      if !records.is_empty() {
        warn!(records = records.len(), "batch has no keys; nothing to store");
      }
      return Ok(report);
    }

    info!(%table, columns = all_keys.len(), "creating table if it does not exist");
    store
      .create_table(table, &all_keys)
      .await
      .map_err(|e| schema_error(table, SchemaStep::Create, e))?;
    info!(%table, "table created or already exists");

    report.added_columns = ensure_columns(store, table, all_keys.iter().copied())
      .await
      .map_err(|(step, e)| schema_error(table, step, e))?;

    store
      .begin()
      .await
      .map_err(|e| Error::Transaction(Box::new(e)))?;

    for (row, record) in records.iter().enumerate() {
      match insert_record(store, table, row, record).await {
        Ok(added) => report.added_columns.extend(added),
        Err(source) => {
          rollback_quietly(store).await;
          return Err(Error::Insert { row, source: Box::new(source) });
        }
      }
      report.rows_inserted += 1;
    }

    if let Err(e) = store.commit().await {
      rollback_quietly(store).await;
      return Err(Error::Transaction(Box::new(e)));
    }
    info!(%table, rows = report.rows_inserted, "batch committed");

    Ok(report)
  }
}

/// Add every column in `keys` that `table` does not have yet. Returns the
/// columns that were added.
async fn ensure_columns<'k, S: TableStore>(
  store: &mut S,
  table: &Identifier,
  keys: impl IntoIterator<Item = &'k Identifier>,
) -> Result<Vec<Identifier>, (SchemaStep, S::Error)> {
  let existing = store
    .columns(table)
    .await
    .map_err(|e| (SchemaStep::Introspect, e))?;

  let mut added = Vec::new();
  for column in keys {
    if existing.contains(column.as_str()) {
      continue;
    }
    debug!(%table, %column, "adding missing column");
    store
      .add_column(table, column)
      .await
      .map_err(|e| (SchemaStep::AddColumn, e))?;
    info!(%table, %column, "column added");
    added.push(column.clone());
  }
  Ok(added)
}

/// Insert one record inside the open transaction, first re-checking that
/// each of its keys has a column.
async fn insert_record<S: TableStore>(
  store: &mut S,
  table: &Identifier,
  row: usize,
  record: &Record,
) -> Result<Vec<Identifier>, S::Error> {
  let added = ensure_columns(store, table, record.keys())
    .await
    .map_err(|(_, e)| e)?;

  info!(%table, row, fields = record.len(), "inserting row");
  debug!(?record, "row contents");
  store.insert_row(table, record).await?;
  Ok(added)
}

async fn rollback_quietly<S: TableStore>(store: &mut S) {
  if let Err(e) = store.rollback().await {
    warn!(error = %e, "rollback failed");
  }
}

fn schema_error<E>(table: &Identifier, step: SchemaStep, e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Schema { table: table.to_string(), step, source: Box::new(e) }
}
