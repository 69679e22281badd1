//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL journaling and a
//!   5000ms busy_timeout.
//! - Embedded Diesel migrations: [`migrate::run_sqlite`] brings a database file up to date.
//!
//! Example:
//! ```no_run
//! use draw_sync::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("draw_sync_example.db");
//! migrate::run_sqlite(db_path.to_str().unwrap()).expect("migrations");
//!
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;
