//! Bot settings loading from config.toml
//!
//! Channel ids, the member role name, provider tuning and refresh behaviour are read
//! from a TOML file. Secrets (the bot token, the database URL) stay in the environment.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Discord channels and roles
    #[serde(default)]
    pub discord: DiscordSettings,
    /// KoG website access
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Nightly refresh behaviour
    #[serde(default)]
    pub refresh: RefreshSettings,
}

/// Discord-side settings
#[derive(Debug, Deserialize, Clone)]
pub struct DiscordSettings {
    /// Channel where registrations are posted for moderation
    pub log_channel_id: Option<u64>,
    /// Channel where query commands are allowed and new members are welcomed
    pub command_channel_id: Option<u64>,
    /// Role granted to approved members
    #[serde(default = "default_member_role_name")]
    pub member_role_name: String,
    /// Guild for fast command registration during development
    pub dev_guild_id: Option<u64>,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            log_channel_id: None,
            command_channel_id: None,
            member_role_name: default_member_role_name(),
            dev_guild_id: None,
        }
    }
}

/// KoG website settings
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    /// Base URL of the KoG website
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per player fetch (each attempt re-sends the priming request)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Nightly refresh settings
#[derive(Debug, Deserialize, Clone)]
pub struct RefreshSettings {
    /// Whether the midnight refresh task is started
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Player fetches running at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
        }
    }
}

fn default_member_role_name() -> String {
    "KoG".to_string()
}

fn default_base_url() -> String {
    "https://kog.tw".to_string()
}

const fn default_timeout_secs() -> u64 {
    15
}

const fn default_max_attempts() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_concurrency() -> usize {
    8
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if settings.refresh.concurrency == 0 {
        return Err(Error::Config {
            message: "refresh.concurrency must be at least 1".to_string(),
        });
    }
    if settings.provider.max_attempts == 0 {
        return Err(Error::Config {
            message: "provider.max_attempts must be at least 1".to_string(),
        });
    }

    Ok(settings)
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid,
/// or a value is out of range.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `KOG_BOT_CONFIG`, or `./config.toml` when unset.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("KOG_BOT_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [discord]
            log_channel_id = 1030466547325607936
            command_channel_id = 1030466547325607937
            member_role_name = "Gores"

            [provider]
            base_url = "http://localhost:8080"
            timeout_secs = 5
            max_attempts = 3

            [refresh]
            enabled = false
            concurrency = 2
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.discord.log_channel_id, Some(1_030_466_547_325_607_936));
        assert_eq!(settings.discord.member_role_name, "Gores");
        assert_eq!(settings.provider.base_url, "http://localhost:8080");
        assert_eq!(settings.provider.max_attempts, 3);
        assert!(!settings.refresh.enabled);
        assert_eq!(settings.refresh.concurrency, 2);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.discord.member_role_name, "KoG");
        assert!(settings.discord.log_channel_id.is_none());
        assert_eq!(settings.provider.base_url, "https://kog.tw");
        assert_eq!(settings.provider.timeout_secs, 15);
        assert!(settings.refresh.enabled);
        assert_eq!(settings.refresh.concurrency, 8);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = parse_settings("[refresh]\nconcurrency = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
