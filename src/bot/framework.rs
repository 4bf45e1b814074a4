//! Poise framework setup - command list, error reporting, event routing and client
//! startup.

use crate::{
    bot::{BotData, commands, handlers::moderation},
    errors::{Error, ErrorCategory, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!(error = %error, "Failed to start bot");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let command = ctx.command().qualified_name.clone();
            match error.category() {
                ErrorCategory::Validation | ErrorCategory::NotFound => {
                    info!(command = %command, error = %error, "Command rejected");
                }
                ErrorCategory::Provider => {
                    warn!(command = %command, error = %error, "Command failed on KoG provider");
                }
                ErrorCategory::Store | ErrorCategory::Internal => {
                    error!(command = %command, error = ?error, "Command failed");
                }
            }
            let reply = poise::CreateReply::default()
                .content(error.user_message())
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!(error = %e, "Failed to send error message");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!(error = %e, "Error while handling error");
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        if let Err(e) = moderation::handle_component(ctx, component, data).await {
            error!(error = %e, "Failed to handle registration button");
        }
    }
    Ok(())
}

/// Builds the Discord client and runs it until Ctrl-C.
///
/// On Ctrl-C `shutdown` is raised (stopping the refresh scheduler) and every shard is
/// shut down, which makes this function return.
#[instrument(skip_all)]
pub async fn run_bot(token: String, data: BotData, shutdown: watch::Sender<bool>) -> Result<()> {
    let dev_guild_id = data.settings.discord.dev_guild_id;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![commands::kog(), commands::ping(), commands::help()],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(user = %ready.user.name, "Logged in");
                match dev_guild_id {
                    Some(guild_id) => {
                        let guild_id = serenity::GuildId::new(guild_id);
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            guild_id,
                        )
                        .await?;
                        info!(guild_id = %guild_id, "Registered commands in development guild");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        info!("Registered commands globally");
                    }
                }
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Shutdown requested");
        let _ = shutdown.send(true);
        shard_manager.shutdown_all().await;
    });

    info!("Starting Discord client");
    client.start().await?;
    Ok(())
}
