use serde::{Deserialize, Serialize};

/// Frequency statistics published by the lottery operator.
///
/// Entries are reported in the operator's order; no sorting is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialStatistics {
    pub numbers: Vec<u32>,
    pub bonus_numbers: Vec<u32>,
}
