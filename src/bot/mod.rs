//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the KoG bot: slash commands,
//! autocomplete, the registration moderation buttons and the poise framework setup.

/// Discord command implementations (kog, general)
pub mod commands;
/// Custom ids and message components shared by commands and handlers
pub mod components;
/// Poise framework setup, error handling and client startup
pub mod framework;
/// Discord interaction handlers (autocomplete, moderation buttons)
pub mod handlers;

use crate::{config::settings::Settings, provider::KogProvider};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared data available to all bot commands.
/// This structure holds the database connection, the KoG website client and the
/// loaded settings.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Source of player and map data
    pub provider: Arc<dyn KogProvider>,
    /// Settings loaded from config.toml
    pub settings: Settings,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        provider: Arc<dyn KogProvider>,
        settings: Settings,
    ) -> Self {
        Self {
            database,
            provider,
            settings,
        }
    }
}

pub use commands::*;
pub use framework::run_bot;
