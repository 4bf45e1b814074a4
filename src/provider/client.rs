use super::parser::{parse_map_page, parse_player_response};
use super::{KogProvider, MapListing, PlayerSnapshot, ProviderError};
use crate::config::settings::ProviderSettings;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct PlayerRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    player: &'a str,
}

/// Runs `attempt` until it succeeds, fails with [`ProviderError::NotFound`], or
/// `max_attempts` tries were made. Exactly one outcome is returned.
async fn with_retries<T, F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut attempt: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e @ ProviderError::NotFound { .. }) => return Err(e),
            Err(e) if tries >= max_attempts => return Err(e),
            Err(e) => {
                warn!(attempt = tries, error = %e, "Player fetch failed, retrying");
                tries += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// HTTP client for the KoG website.
pub struct KogWebClient {
    base_url: String,
    max_attempts: u32,
    client: reqwest::Client,
}

impl KogWebClient {
    /// Builds a client from provider settings.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) kog-bot")
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_attempts: settings.max_attempts.max(1),
            client,
        })
    }

    /// The players API only answers after the player page has been requested once.
    async fn prime_player(&self, username: &str) -> Result<(), ProviderError> {
        let url = format!("{}/get.php", self.base_url);
        self.client
            .get(&url)
            .query(&[("p", "players"), ("player", username)])
            .send()
            .await?;
        Ok(())
    }

    async fn request_player(&self, username: &str) -> Result<PlayerSnapshot, ProviderError> {
        self.prime_player(username).await?;

        let url = format!("{}/api.php", self.base_url);
        let body = self
            .client
            .post(&url)
            .json(&PlayerRequest {
                kind: "players",
                player: username,
            })
            .send()
            .await?
            .text()
            .await?;

        parse_player_response(username, &body)
    }
}

#[async_trait]
impl KogProvider for KogWebClient {
    #[instrument(skip(self))]
    async fn fetch_player(&self, username: &str) -> Result<PlayerSnapshot, ProviderError> {
        // Each attempt sends its own priming GET
        let snapshot = with_retries(self.max_attempts, RETRY_DELAY, || {
            self.request_player(username)
        })
        .await?;
        debug!(
            finished_maps = snapshot.completed_maps.len(),
            "Fetched player data"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn fetch_all_maps(&self) -> Result<Vec<MapListing>, ProviderError> {
        let url = format!("{}/get.php", self.base_url);
        let html = self
            .client
            .get(&url)
            .query(&[("p", "maps")])
            .send()
            .await?
            .text()
            .await?;

        let maps = parse_map_page(&html)?;
        debug!(count = maps.len(), "Fetched map catalog");
        Ok(maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ProviderError {
        ProviderError::Status { status: 503 }
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(3, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::NotFound {
                username: "nobody".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ProviderError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persistent_failure_stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(3, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Status { status: 503 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_then_success_returns_value() {
        let calls = AtomicU32::new(0);
        let result = with_retries(2, Duration::ZERO, || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(unavailable())
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_attempt_never_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(1, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
