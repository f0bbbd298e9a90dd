//! [`PgStore`]: the PostgreSQL implementation of [`TableStore`].

use std::{collections::BTreeSet, str::FromStr};

use docload_core::{
  Identifier, Record,
  sql::{self, Placeholder},
  store::TableStore,
};
use sqlx::{
  ConnectOptions as _, Connection as _, Executor as _, PgConnection,
  postgres::{PgConnectOptions, PgSslMode},
};
use tracing::{debug, info};

use crate::Result;

const COLUMNS_QUERY: &str = "
SELECT column_name::text
  FROM information_schema.columns
 WHERE table_schema = current_schema()
   AND table_name = $1
";

/// Parse a `postgres://` URL into connect options with encryption required.
///
/// A weaker `sslmode` in the URL (`disable`, `allow`, `prefer`, or none at
/// all) is raised to `require`; `verify-ca` and `verify-full` are kept.
pub fn connect_options(url: &str) -> Result<PgConnectOptions> {
  let options = PgConnectOptions::from_str(url)?;
  let ssl_mode = match options.get_ssl_mode() {
    mode @ (PgSslMode::Require | PgSslMode::VerifyCa | PgSslMode::VerifyFull) => {
      mode
    }
    _ => PgSslMode::Require,
  };
  Ok(options.ssl_mode(ssl_mode).disable_statement_logging())
}

/// A loader destination backed by one PostgreSQL connection.
pub struct PgStore {
  pub(crate) conn: PgConnection,
}

impl PgStore {
  /// Connect to `url`. See [`connect_options`] for the TLS policy.
  pub async fn connect(url: &str) -> Result<Self> {
    let options = connect_options(url)?;
    info!(
      host = options.get_host(),
      port = options.get_port(),
      database = options.get_database().unwrap_or_default(),
      "connecting to postgres"
    );
    let conn = PgConnection::connect_with(&options).await?;
    Ok(Self { conn })
  }

  pub(crate) async fn execute_raw(&mut self, statement: &str) -> Result<()> {
    debug!(%statement, "postgres statement");
    (&mut self.conn).execute(sqlx::raw_sql(statement)).await?;
    Ok(())
  }
}

impl TableStore for PgStore {
  type Error = crate::Error;

  async fn columns(&mut self, table: &Identifier) -> Result<BTreeSet<String>> {
    let names: Vec<String> = sqlx::query_scalar(COLUMNS_QUERY)
      .bind(table.as_str())
      .fetch_all(&mut self.conn)
      .await?;
    Ok(names.into_iter().collect())
  }

  async fn drop_table(&mut self, table: &Identifier) -> Result<()> {
    self.execute_raw(&sql::drop_table(table)).await
  }

  async fn create_table(
    &mut self,
    table:   &Identifier,
    columns: &[&Identifier],
  ) -> Result<()> {
    self.execute_raw(&sql::create_table(table, columns)).await
  }

  async fn add_column(
    &mut self,
    table:  &Identifier,
    column: &Identifier,
  ) -> Result<()> {
    self.execute_raw(&sql::add_column(table, column)).await
  }

  async fn begin(&mut self) -> Result<()> { self.execute_raw("BEGIN").await }

  async fn insert_row(&mut self, table: &Identifier, record: &Record) -> Result<()> {
    let statement = sql::insert(table, record, Placeholder::Dollar);
    debug!(%statement, "postgres insert");

    // Column sets vary per record; don't fill the prepared-statement cache.
    let mut query = sqlx::query(&statement).persistent(false);
    for (_, value) in record {
      query = query.bind(value.as_deref());
    }
    query.execute(&mut self.conn).await?;
    Ok(())
  }

  async fn commit(&mut self) -> Result<()> { self.execute_raw("COMMIT").await }

  async fn rollback(&mut self) -> Result<()> {
    self.execute_raw("ROLLBACK").await
  }

  async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }
}
