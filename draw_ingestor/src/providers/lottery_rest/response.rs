use serde::Deserialize;

use crate::models::{draw::DrawResult, statistics::OfficialStatistics};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DrawResponse {
    pub game_id: u32,
    pub numbers: Vec<u32>,
    #[serde(default)]
    pub bonus: Vec<u32>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DrawPageResponse {
    #[serde(default)]
    pub draws: Vec<DrawResponse>,
    pub next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub numbers: Vec<u32>,
    #[serde(default)]
    pub bonus_numbers: Vec<u32>,
}

impl From<DrawResponse> for DrawResult {
    fn from(r: DrawResponse) -> Self {
        DrawResult::new(r.game_id, r.numbers, r.bonus)
    }
}

impl From<StatisticsResponse> for OfficialStatistics {
    fn from(r: StatisticsResponse) -> Self {
        OfficialStatistics {
            numbers: r.numbers,
            bonus_numbers: r.bonus_numbers,
        }
    }
}
