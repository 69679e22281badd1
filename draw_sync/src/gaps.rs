//! Gap detection over draw ids.
//!
//! Stored ids are held in a [`RoaringBitmap`]; the missing set is the set difference
//! between the inclusive id window and the stored ids.

use draw_ingestor::{models::draw::DrawId, providers::ResultSource};
use roaring::RoaringBitmap;

use crate::errors::BackfillError;

/// First id the lottery ever assigned.
pub const FIRST_DRAW_ID: DrawId = 1;

/// How the id window for a gap-fill is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapMode {
    /// Only look between the lowest and highest stored id.
    Within,
    /// Look from [`FIRST_DRAW_ID`] up to the currently active draw.
    Bootstrap,
}

/// Snapshot of the ids currently persisted.
pub fn stored_ids<'a>(ids: impl IntoIterator<Item = &'a DrawId>) -> RoaringBitmap {
    ids.into_iter().copied().collect()
}

/// `{start..=stop} - stored`.
pub fn missing_ids(
    stored: &RoaringBitmap,
    start: DrawId,
    stop: DrawId,
) -> Result<RoaringBitmap, BackfillError> {
    if start > stop {
        return Err(BackfillError::InvalidRange { start, stop });
    }

    let mut window = RoaringBitmap::new();
    window.insert_range(start..=stop);
    Ok(&window - stored)
}

/// Picks the inclusive id window for `mode`.
///
/// Bootstrap asks the source for the active draw; a failure there is fatal for the
/// whole gap-fill.
pub async fn resolve_range(
    mode: GapMode,
    stored: &RoaringBitmap,
    source: &dyn ResultSource,
) -> Result<(DrawId, DrawId), BackfillError> {
    match mode {
        GapMode::Within => match (stored.min(), stored.max()) {
            (Some(start), Some(stop)) => Ok((start, stop)),
            _ => Err(BackfillError::EmptyStore),
        },
        GapMode::Bootstrap => {
            let active = source
                .fetch_active_draw()
                .await
                .map_err(|source| BackfillError::ActiveDrawUnavailable { source })?;
            Ok((FIRST_DRAW_ID, active.game_id))
        }
    }
}
