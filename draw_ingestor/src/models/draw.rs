//! Canonical in-memory representation of a single lottery draw.
//!
//! This struct is the standard output of every [`ResultSource`](crate::providers::ResultSource)
//! implementation and the value type persisted by the draw store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier the lottery assigns to each draw, ascending over time.
pub type DrawId = u32;

/// Draws keyed by their id. Iteration is in ascending id order.
pub type DrawMap = BTreeMap<DrawId, DrawResult>;

/// The published result of one draw.
///
/// Results are immutable once published; fetching the same id twice yields the
/// same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    /// The draw identifier.
    pub game_id: DrawId,

    /// Main winning numbers, in the order the source reports them.
    pub winning_numbers: Vec<u32>,

    /// Bonus numbers. Empty for games without a bonus ball.
    #[serde(default)]
    pub bonus_numbers: Vec<u32>,
}

impl DrawResult {
    pub fn new(game_id: DrawId, winning_numbers: Vec<u32>, bonus_numbers: Vec<u32>) -> Self {
        Self {
            game_id,
            winning_numbers,
            bonus_numbers,
        }
    }
}

/// Collects results into a [`DrawMap`]. A later result with the same id replaces an earlier one.
pub fn into_draw_map(results: impl IntoIterator<Item = DrawResult>) -> DrawMap {
    results.into_iter().map(|r| (r.game_id, r)).collect()
}
