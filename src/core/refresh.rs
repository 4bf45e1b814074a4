//! Nightly resync of player snapshots and the map catalog.
//!
//! A cycle re-fetches every registered player with bounded concurrency, replacing each
//! snapshot wholesale, and then upserts the whole map catalog. One player's failure is
//! logged and skipped; it never aborts the rest of the batch. Failed players are not
//! retried until the next cycle.

use crate::{
    config::settings::RefreshSettings,
    core::{map as map_catalog, player as player_store},
    errors::Result,
    provider::KogProvider,
};
use chrono::{DateTime, Local, TimeZone};
use futures::{StreamExt, stream};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of refreshing every registered player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Players whose snapshot was replaced
    pub updated: usize,
    /// Players that unregistered while the refresh was running
    pub skipped: usize,
    /// Players that could not be refreshed, with the reason
    pub failed: Vec<(String, String)>,
}

enum PlayerOutcome {
    Updated,
    Vanished,
    Failed(String),
}

async fn refresh_player(
    db: &DatabaseConnection,
    provider: &dyn KogProvider,
    username: &str,
) -> PlayerOutcome {
    let snapshot = match provider.fetch_player(username).await {
        Ok(snapshot) => snapshot,
        Err(e) => return PlayerOutcome::Failed(e.to_string()),
    };
    match player_store::replace_snapshot(db, username, &snapshot).await {
        Ok(Some(_)) => PlayerOutcome::Updated,
        Ok(None) => PlayerOutcome::Vanished,
        Err(e) => PlayerOutcome::Failed(e.to_string()),
    }
}

/// Re-fetches every registered player and replaces their stored snapshot.
///
/// At most `concurrency` fetches run at once. Only existing players are updated.
///
/// # Errors
/// Only when the list of registered players cannot be read.
#[instrument(skip(db, provider))]
pub async fn update_all_user_data(
    db: &DatabaseConnection,
    provider: &dyn KogProvider,
    concurrency: usize,
) -> Result<RefreshSummary> {
    let usernames = player_store::get_registered_usernames(db).await?;
    info!(players = usernames.len(), "Refreshing player data");

    let outcomes: Vec<(String, PlayerOutcome)> = stream::iter(usernames)
        .map(|username| async move {
            let outcome = refresh_player(db, provider, &username).await;
            (username, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut summary = RefreshSummary::default();
    for (username, outcome) in outcomes {
        match outcome {
            PlayerOutcome::Updated => summary.updated += 1,
            PlayerOutcome::Vanished => {
                warn!(username = %username, "Player disappeared during refresh, skipped");
                summary.skipped += 1;
            }
            PlayerOutcome::Failed(reason) => {
                warn!(username = %username, error = %reason, "Failed to refresh player");
                summary.failed.push((username, reason));
            }
        }
    }

    info!(
        updated = summary.updated,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        "Player data refreshed"
    );
    Ok(summary)
}

/// Fetches the full map catalog and upserts every entry.
///
/// Maps missing from the website are kept. Returns the number of maps written.
#[instrument(skip(db, provider))]
pub async fn update_map_data(db: &DatabaseConnection, provider: &dyn KogProvider) -> Result<usize> {
    let listings = provider.fetch_all_maps().await?;
    map_catalog::upsert_maps(db, &listings).await
}

/// Runs one full cycle: all players, then the map catalog.
///
/// Errors are logged; a failed player phase does not prevent the map phase.
pub async fn run_refresh_cycle(
    db: &DatabaseConnection,
    provider: &dyn KogProvider,
    concurrency: usize,
) {
    info!("Refresh cycle started");

    if let Err(e) = update_all_user_data(db, provider, concurrency).await {
        error!(error = %e, "Player refresh failed");
    }
    match update_map_data(db, provider).await {
        Ok(count) => info!(maps = count, "Map catalog refreshed"),
        Err(e) => error!(error = %e, "Map refresh failed"),
    }

    info!("Refresh cycle finished");
}

/// Time from `now` until the next local midnight.
///
/// Exactly at midnight the next boundary is a full day away. When midnight does not
/// exist locally (a DST gap) a full day is used instead.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    now.date_naive()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
        .and_then(|next| next.signed_duration_since(now).to_std().ok())
        .unwrap_or(ONE_DAY)
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender also counts as shutdown
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Runs a refresh cycle every local midnight until `shutdown` turns `true`.
///
/// Shutdown interrupts both the sleep and an in-flight cycle; a cycle is never started
/// once shutdown was requested.
pub async fn run_scheduler(
    db: DatabaseConnection,
    provider: Arc<dyn KogProvider>,
    settings: RefreshSettings,
    shutdown: watch::Receiver<bool>,
) {
    scheduler_loop(db, provider, settings.concurrency, shutdown, || {
        duration_until_next_midnight(&Local::now())
    })
    .await;
}

async fn scheduler_loop<F>(
    db: DatabaseConnection,
    provider: Arc<dyn KogProvider>,
    concurrency: usize,
    mut shutdown: watch::Receiver<bool>,
    next_delay: F,
) where
    F: Fn() -> Duration + Send,
{
    info!(concurrency, "Refresh scheduler started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let delay = next_delay();
        info!(seconds = delay.as_secs(), "Next refresh scheduled");

        tokio::select! {
            biased;
            () = shutdown_requested(&mut shutdown) => break,
            () = tokio::time::sleep(delay) => {}
        }

        tokio::select! {
            biased;
            () = shutdown_requested(&mut shutdown) => {
                warn!("Refresh cycle cancelled by shutdown");
                break;
            }
            () = run_refresh_cycle(&db, provider.as_ref(), concurrency) => {}
        }
    }

    info!("Refresh scheduler stopped");
}
