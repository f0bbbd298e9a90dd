//! PostgreSQL backend for the docload loader.
//!
//! Holds exactly one [`sqlx::PgConnection`], opened with TLS required, for the
//! lifetime of the store.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{PgStore, connect_options};
