use std::path::{Path, PathBuf};

use async_trait::async_trait;
use diesel::{prelude::*, upsert::excluded};
use draw_ingestor::models::draw::{DrawId, DrawMap, DrawResult};
use tracing::debug;

use crate::{
    db::{connection::connect_sqlite, migrate},
    schema::draw_results,
    store::{DrawStore, StoreError},
};

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = draw_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DrawRow {
    game_id: String,
    winning_numbers: String,
    bonus_numbers: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = draw_results)]
struct NewDrawRow {
    game_id: String,
    winning_numbers: String,
    bonus_numbers: String,
}

impl NewDrawRow {
    /// The row is keyed by `id`, the map key it was stored under.
    fn encode(id: DrawId, draw: &DrawResult) -> Result<Self, StoreError> {
        let encode = |numbers: &Vec<u32>| {
            serde_json::to_string(numbers).map_err(|source| StoreError::Encode { id, source })
        };
        Ok(Self {
            game_id: id.to_string(),
            winning_numbers: encode(&draw.winning_numbers)?,
            bonus_numbers: encode(&draw.bonus_numbers)?,
        })
    }
}

impl DrawRow {
    fn decode(self) -> Result<DrawResult, StoreError> {
        let game_id: DrawId = self.game_id.parse().map_err(|_| StoreError::Decode {
            key: self.game_id.clone(),
            message: "key is not a draw id".to_string(),
        })?;

        let decode = |column: &str, raw: &str| {
            serde_json::from_str::<Vec<u32>>(raw).map_err(|e| StoreError::Decode {
                key: self.game_id.clone(),
                message: format!("{column}: {e}"),
            })
        };

        Ok(DrawResult::new(
            game_id,
            decode("winning_numbers", &self.winning_numbers)?,
            decode("bonus_numbers", &self.bonus_numbers)?,
        ))
    }
}

/// Draw store backed by a single SQLite file.
///
/// Each call opens its own connection and drops it before returning, so no
/// handle outlives a read or a write.
#[derive(Clone, Debug)]
pub struct SqliteDrawStore {
    path: PathBuf,
}

impl SqliteDrawStore {
    /// Opens (creating if needed) the database at `path` and applies pending migrations.
    ///
    /// A missing parent directory is created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let store = Self { path };
        migrate::run_sqlite(&store.url())?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn put_blocking(url: &str, rows: Vec<NewDrawRow>) -> Result<(), StoreError> {
        use crate::schema::draw_results::dsl::*;

        let mut conn = connect_sqlite(url)?;
        conn.immediate_transaction(|conn| {
            for row in &rows {
                diesel::insert_into(draw_results)
                    .values(row)
                    .on_conflict(game_id)
                    .do_update()
                    .set((
                        winning_numbers.eq(excluded(winning_numbers)),
                        bonus_numbers.eq(excluded(bonus_numbers)),
                    ))
                    .execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(())
        })?;
        Ok(())
    }

    fn get_all_blocking(url: &str) -> Result<DrawMap, StoreError> {
        let mut conn = connect_sqlite(url)?;
        let rows = draw_results::table
            .select(DrawRow::as_select())
            .load(&mut conn)?;

        rows.into_iter()
            .map(|row| row.decode().map(|d| (d.game_id, d)))
            .collect()
    }
}

#[async_trait]
impl DrawStore for SqliteDrawStore {
    async fn put(&self, draws: &DrawMap) -> Result<(), StoreError> {
        if draws.is_empty() {
            return Ok(());
        }

        let rows = draws
            .iter()
            .map(|(&id, draw)| NewDrawRow::encode(id, draw))
            .collect::<Result<Vec<_>, _>>()?;
        let count = rows.len();
        let url = self.url();

        tokio::task::spawn_blocking(move || Self::put_blocking(&url, rows)).await??;
        debug!(count, path = %self.path.display(), "persisted draws");
        Ok(())
    }

    async fn get_all(&self) -> Result<DrawMap, StoreError> {
        let url = self.url();
        let draws = tokio::task::spawn_blocking(move || Self::get_all_blocking(&url)).await??;
        debug!(count = draws.len(), path = %self.path.display(), "loaded draws");
        Ok(draws)
    }
}
