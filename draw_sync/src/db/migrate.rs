//! Embedded schema migrations.

use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::{db::connection::connect_sqlite, store::StoreError};

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending Diesel migrations on the SQLite database at `url`.
///
/// Idempotent: an up-to-date database is left untouched.
pub fn run_sqlite(url: &str) -> Result<(), StoreError> {
    let mut conn = connect_sqlite(url)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::Migration(e.to_string()))?;
    Ok(())
}
