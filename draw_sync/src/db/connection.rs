//! SQLite connection helpers.

use diesel::{Connection, SqliteConnection, connection::SimpleConnection};

use crate::store::StoreError;

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> Result<SqliteConnection, StoreError> {
    let mut conn =
        SqliteConnection::establish(database_url).map_err(|source| StoreError::Open {
            path: database_url.to_string(),
            source,
        })?;

    // WAL keeps the file readable while a batch is being written.
    conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    Ok(conn)
}
