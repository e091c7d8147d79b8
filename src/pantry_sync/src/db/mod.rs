//! Database utilities for connections and schema migrations.
//!
//! - [`connection::connect_sqlite`] opens a connection with WAL,
//!   foreign_keys=ON, and a 5000ms busy_timeout applied.
//! - [`migrate::run`] applies the embedded Diesel migrations.

pub mod connection;
pub mod migrate;
