//! Shared test utilities.
//!
//! This module provides an in-memory database setup, a scriptable [`FakeProvider`]
//! standing in for the KoG website, and builders for snapshots and map listings.

use crate::{
    core::registration::{self, ApprovedRegistration},
    errors::Result,
    provider::{CompletedMap, KogProvider, MapListing, PlayerSnapshot, ProviderError},
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};
use tokio::sync::RwLock;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a snapshot that finished exactly the given maps.
///
/// # Defaults
/// * rank: 10
/// * points: 100 base + 20 season
/// * time: 42.5 seconds per map
pub fn snapshot_with_maps(map_names: &[&str]) -> PlayerSnapshot {
    PlayerSnapshot {
        rank: 10,
        total_points: 120,
        base_points: 100,
        season_points: 20,
        completed_maps: map_names
            .iter()
            .map(|name| CompletedMap {
                map_name: (*name).to_string(),
                time: 42.5,
                finished_at: "2024-01-01 12:00:00".to_string(),
            })
            .collect(),
    }
}

/// Builds a catalog listing with a fixed author and release date.
pub fn map_listing(name: &str, difficulty: &str, stars: i32, points: i32) -> MapListing {
    MapListing {
        name: name.to_string(),
        difficulty: difficulty.to_string(),
        stars,
        points,
        author: "Tester".to_string(),
        released_at: "2023-05-01".to_string(),
    }
}

/// Small catalog: Hard `M1`..`M3`, Easy `E1` and Insane `I1`.
pub fn sample_catalog() -> Vec<MapListing> {
    vec![
        map_listing("M1", "Hard", 3, 20),
        map_listing("M2", "Hard", 2, 15),
        map_listing("M3", "Hard", 4, 30),
        map_listing("E1", "Easy", 1, 2),
        map_listing("I1", "Insane", 5, 50),
    ]
}

/// Registers `username` for `discord_user_id` and approves it as moderator `"mod"`.
pub async fn register_and_approve(
    db: &DatabaseConnection,
    provider: &dyn KogProvider,
    discord_user_id: &str,
    username: &str,
) -> Result<ApprovedRegistration> {
    let pending = registration::register(db, discord_user_id, username).await?;
    registration::approve_registration(db, provider, "mod", &pending.id).await
}

/// In-memory [`KogProvider`].
///
/// Unknown players are reported as [`ProviderError::NotFound`]; players marked with
/// [`FakeProvider::fail_player`] fail with a 500 status.
#[derive(Default)]
pub struct FakeProvider {
    players: RwLock<HashMap<String, PlayerSnapshot>>,
    maps: RwLock<Vec<MapListing>>,
    failing: RwLock<HashSet<String>>,
    delay: RwLock<Option<Duration>>,
    player_fetches: AtomicUsize,
}

impl FakeProvider {
    /// Creates a provider that knows no players and no maps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider knowing each name with an empty snapshot.
    pub async fn with_players(usernames: &[&str]) -> Self {
        let provider = Self::new();
        for name in usernames {
            provider.set_player(name, snapshot_with_maps(&[])).await;
        }
        provider
    }

    /// Sets (or replaces) the snapshot returned for a player.
    pub async fn set_player(&self, username: &str, snapshot: PlayerSnapshot) {
        self.players
            .write()
            .await
            .insert(username.to_string(), snapshot);
    }

    /// Sets the map catalog returned by `fetch_all_maps`.
    pub async fn set_maps(&self, maps: Vec<MapListing>) {
        *self.maps.write().await = maps;
    }

    /// Makes every fetch of this player fail.
    pub async fn fail_player(&self, username: &str) {
        self.failing.write().await.insert(username.to_string());
    }

    /// Delays every player fetch.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Number of player fetches served so far.
    pub fn player_fetches(&self) -> usize {
        self.player_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KogProvider for FakeProvider {
    async fn fetch_player(&self, username: &str) -> std::result::Result<PlayerSnapshot, ProviderError> {
        self.player_fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(username) {
            return Err(ProviderError::Status { status: 500 });
        }
        self.players
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                username: username.to_string(),
            })
    }

    async fn fetch_all_maps(&self) -> std::result::Result<Vec<MapListing>, ProviderError> {
        Ok(self.maps.read().await.clone())
    }
}
