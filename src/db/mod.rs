//! Database module
//!
//! SQLite connection pool and versioned schema migrations.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};
