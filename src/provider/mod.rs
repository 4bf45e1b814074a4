//! Access to the KoG website.
//!
//! The rest of the bot only sees the [`KogProvider`] trait: fetch one player's points
//! and finished maps, or fetch the whole map catalog. [`KogWebClient`] implements it
//! over HTTP; tests substitute an in-memory fake.

mod client;
mod models;
mod parser;

pub use client::KogWebClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a [`KogProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The website has no player with this name.
    #[error("player '{username}' not found on KoG")]
    NotFound {
        /// The requested username
        username: String,
    },

    /// The HTTP request failed or timed out.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The website answered with an unexpected status code.
    #[error("unexpected response status {status}")]
    Status {
        /// Status reported by the website
        status: i64,
    },

    /// The response did not have the expected shape.
    #[error("failed to parse KoG response: {message}")]
    Parse {
        /// What could not be parsed
        message: String,
    },
}

/// One completed map in a player snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedMap {
    /// Map name
    pub map_name: String,
    /// Best time in seconds
    pub time: f64,
    /// When the map was finished, as reported by the website
    pub finished_at: String,
}

/// Points and completions of a single player at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// Global rank
    pub rank: i32,
    /// Total points
    pub total_points: i32,
    /// Points outside the current season
    pub base_points: i32,
    /// Points earned this season
    pub season_points: i32,
    /// Every finished map
    pub completed_maps: Vec<CompletedMap>,
}

/// One entry of the website's map catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapListing {
    /// Map name
    pub name: String,
    /// Difficulty label as shown on the website
    pub difficulty: String,
    /// Filled stars, 0 to 5
    pub stars: i32,
    /// Points awarded for finishing
    pub points: i32,
    /// Map author(s)
    pub author: String,
    /// Release time as shown on the website
    pub released_at: String,
}

/// Source of player and map data.
///
/// Implementations may retry internally but must return a single outcome per call.
#[async_trait]
pub trait KogProvider: Send + Sync {
    /// Fetches the current snapshot of one player.
    async fn fetch_player(&self, username: &str) -> Result<PlayerSnapshot, ProviderError>;

    /// Fetches the full map catalog.
    async fn fetch_all_maps(&self) -> Result<Vec<MapListing>, ProviderError>;
}
