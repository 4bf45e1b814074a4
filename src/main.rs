use dotenvy::dotenv;
use kog_bot::{
    bot::{self, BotData},
    config::{database, settings},
    core::refresh,
    errors::{Error, Result},
    provider::{KogProvider, KogWebClient},
};
use std::{env, sync::Arc};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load config.toml
    let settings = settings::load_default_settings()
        .inspect_err(|e| error!(error = %e, "Failed to load settings"))?;
    info!("Settings loaded");

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!(error = %e, "Failed to connect to database"))?;
    database::create_tables(&db).await?;
    info!("Database initialized");

    // 5. KoG website client
    let provider: Arc<dyn KogProvider> = Arc::new(KogWebClient::new(&settings.provider)?);

    // 6. Nightly refresh, stopped by the same Ctrl-C that stops the bot
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = if settings.refresh.enabled {
        Some(tokio::spawn(refresh::run_scheduler(
            db.clone(),
            Arc::clone(&provider),
            settings.refresh.clone(),
            shutdown_rx,
        )))
    } else {
        info!("Nightly refresh disabled");
        None
    };

    // 7. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN").map_err(|e| Error::Config {
        message: format!("DISCORD_BOT_TOKEN not set: {e}"),
    })?;
    bot::run_bot(token, BotData::new(db, provider, settings), shutdown_tx).await?;

    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            error!(error = %e, "Refresh scheduler task failed");
        }
    }
    info!("Bot stopped");
    Ok(())
}
