//! Core types for the docload dynamic table loader.
//!
//! This crate holds the record model, identifier validation, input parsing,
//! the [`TableStore`](store::TableStore) abstraction and the [`Loader`]
//! session. It has no database dependency; backends live in
//! `docload-store-sqlite` and `docload-store-postgres`.

pub mod error;
pub mod ident;
pub mod loader;
pub mod record;
pub mod sql;
pub mod store;

pub use error::{Error, Result, SchemaStep};
pub use ident::Identifier;
pub use loader::{DEFAULT_TABLE, LoadReport, Loader};
pub use record::{Record, parse_batch};
