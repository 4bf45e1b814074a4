//! Wire models of the KoG JSON API.
//!
//! The players endpoint wraps its payload twice: the outer object carries a status
//! code and a `data` field that is itself a JSON document encoded as a string.

use super::{CompletedMap, PlayerSnapshot};
use serde::Deserialize;

/// Outer response of `api.php`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    /// Status code reported by the API (200 on success)
    pub status: i64,
    /// JSON-encoded payload, absent or `null` when the player is unknown
    #[serde(default)]
    pub data: Option<String>,
}

/// Decoded `data` payload of a players request.
#[derive(Debug, Deserialize)]
pub struct PlayerRecord {
    /// Rank and point breakdown
    pub points: PlayerPoints,
    /// Every finished map
    #[serde(rename = "finishedMaps", default)]
    pub finished_maps: Vec<FinishedMapRecord>,
}

/// Point breakdown of a player.
#[derive(Debug, Deserialize)]
pub struct PlayerPoints {
    /// Global rank
    #[serde(rename = "Rank")]
    pub rank: i32,
    /// Total points
    #[serde(rename = "TPoints")]
    pub total_points: i32,
    /// Points outside the current season
    #[serde(rename = "Points")]
    pub base_points: i32,
    /// Points earned this season
    #[serde(rename = "Seasonpoints")]
    pub season_points: i32,
}

/// One finished map as returned by the API.
#[derive(Debug, Deserialize)]
pub struct FinishedMapRecord {
    /// Map name
    #[serde(rename = "Map")]
    pub map: String,
    /// Best time in seconds
    #[serde(rename = "Time")]
    pub time: f64,
    /// Completion timestamp
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

impl From<PlayerRecord> for PlayerSnapshot {
    fn from(record: PlayerRecord) -> Self {
        Self {
            rank: record.points.rank,
            total_points: record.points.total_points,
            base_points: record.points.base_points,
            season_points: record.points.season_points,
            completed_maps: record
                .finished_maps
                .into_iter()
                .map(|m| CompletedMap {
                    map_name: m.map,
                    time: m.time,
                    finished_at: m.timestamp,
                })
                .collect(),
        }
    }
}
