//! Persistent draw store.
//!
//! The backfill engine only sees the [`DrawStore`] trait; [`sqlite::SqliteDrawStore`] is the
//! on-disk implementation. Writes are upserts, so persisting a draw that is already
//! present replaces it.

pub mod sqlite;

use std::path::PathBuf;

use async_trait::async_trait;
use draw_ingestor::models::draw::{DrawId, DrawMap};

pub use sqlite::SqliteDrawStore;

/// Default location of the draw database, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "data/results.db";

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while reading or writing the draw store.
pub enum StoreError {
    #[error("cannot create store directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot open store {path}: {source}")]
    Open {
        path: String,
        source: diesel::ConnectionError,
    },

    #[error("store migration failed: {0}")]
    Migration(String),

    #[error("store query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("cannot encode draw {id}: {source}")]
    Encode { id: DrawId, source: serde_json::Error },

    #[error("corrupt record {key:?}: {message}")]
    Decode { key: String, message: String },

    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Durable mapping from draw id to draw result.
#[async_trait]
pub trait DrawStore: Send + Sync {
    /// Upserts every entry under its map key. The write is durable once this returns `Ok`.
    async fn put(&self, draws: &DrawMap) -> Result<(), StoreError>;

    /// Reads the whole store. A store that was never written yields an empty map.
    async fn get_all(&self) -> Result<DrawMap, StoreError>;
}
