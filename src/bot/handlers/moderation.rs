//! Registration moderation buttons.
//!
//! Clicks on `kog-register-*` buttons arrive through the framework's event handler,
//! not a command, because the message that carries them outlives the command that
//! posted it. Approve and reject need the Manage Roles permission; delete is only
//! honoured for the registrant's own pending registration.

use crate::{
    bot::{
        BotData,
        components::{self, RegistrationAction},
    },
    core::registration,
    errors::Result,
};
use poise::serenity_prelude as serenity;
use tracing::{info, instrument, warn};

/// Looks up the member role by name in a guild.
pub async fn find_member_role(
    http: impl AsRef<serenity::Http>,
    guild_id: serenity::GuildId,
    role_name: &str,
) -> Result<Option<serenity::RoleId>> {
    let roles = guild_id.roles(http).await?;
    Ok(roles
        .into_values()
        .find(|role| role.name == role_name)
        .map(|role| role.id))
}

fn can_moderate(interaction: &serenity::ComponentInteraction) -> bool {
    interaction
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.contains(serenity::Permissions::MANAGE_ROLES))
}

fn decided_embed(
    interaction: &serenity::ComponentInteraction,
    title: &str,
    color: u32,
) -> serenity::CreateEmbed {
    let description = interaction
        .message
        .embeds
        .first()
        .and_then(|e| e.description.clone())
        .unwrap_or_default();
    serenity::CreateEmbed::new()
        .author(
            serenity::CreateEmbedAuthor::new(interaction.user.name.clone())
                .icon_url(interaction.user.face()),
        )
        .title(title)
        .description(description)
        .color(color)
}

/// Routes a component interaction to the matching moderation action.
///
/// Interactions whose custom id is not a registration button are ignored.
#[instrument(skip_all, fields(custom_id = %interaction.data.custom_id))]
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some((action, registration_id)) =
        components::parse_registration_custom_id(&interaction.data.custom_id)
    else {
        return Ok(());
    };

    if action != RegistrationAction::Delete && !can_moderate(interaction) {
        interaction
            .create_response(
                &ctx.http,
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content("❌ Only moderators with Manage Roles can review registrations.")
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    }

    // Remove the buttons right away so the record cannot be decided twice from here
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(decided_embed(interaction, "Processing", components::COLOR_PENDING))
                    .components(vec![]),
            ),
        )
        .await?;

    let clicker_id = interaction.user.id.to_string();
    let db = &data.database;

    let outcome = match action {
        RegistrationAction::Approve => {
            match registration::approve_registration(
                db,
                data.provider.as_ref(),
                &clicker_id,
                registration_id,
            )
            .await
            {
                Ok(approved) => {
                    welcome_member(ctx, interaction, data, &approved.registration.discord_user_id)
                        .await;
                    Ok(("Approved", components::COLOR_APPROVED))
                }
                Err(e) => Err(e),
            }
        }
        RegistrationAction::Reject => {
            registration::reject_registration(db, &clicker_id, registration_id)
                .await
                .map(|_| ("Rejected", components::COLOR_REJECTED))
        }
        RegistrationAction::Delete => {
            registration::delete_registration(db, &clicker_id, registration_id)
                .await
                .map(|()| ("Deleted", components::COLOR_DELETED))
        }
    };

    let (embed, rows) = match outcome {
        Ok((title, color)) => {
            info!(registration_id, moderator_id = %clicker_id, result = title, "Registration button handled");
            (decided_embed(interaction, title, color), vec![])
        }
        Err(e) => {
            warn!(registration_id, error = %e, "Registration action failed");
            let embed = decided_embed(interaction, "Action failed", components::COLOR_FAILED)
                .footer(serenity::CreateEmbedFooter::new(e.user_message()));
            // The registration is unchanged, so the same click may work later
            let rows = if e.is_retryable() {
                vec![components::retry_row(action, registration_id)]
            } else {
                vec![]
            };
            (embed, rows)
        }
    };

    interaction
        .edit_response(
            &ctx.http,
            serenity::EditInteractionResponse::new()
                .embed(embed)
                .components(rows),
        )
        .await?;
    Ok(())
}

/// Grants the member role to a freshly approved registrant and greets them.
///
/// The approval is already committed, so failures here are only logged.
async fn welcome_member(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
    discord_user_id: &str,
) {
    let Ok(user_id) = discord_user_id.parse::<u64>().map(serenity::UserId::new) else {
        warn!(discord_user_id, "Stored Discord id is not numeric");
        return;
    };

    if let Some(guild_id) = interaction.guild_id {
        let role_name = &data.settings.discord.member_role_name;
        match find_member_role(&ctx.http, guild_id, role_name).await {
            Ok(Some(role_id)) => {
                if let Err(e) = ctx
                    .http
                    .add_member_role(guild_id, user_id, role_id, Some("KoG registration approved"))
                    .await
                {
                    warn!(error = %e, "Failed to grant member role");
                }
            }
            Ok(None) => warn!(role_name = %role_name, "Member role not found in guild"),
            Err(e) => warn!(error = %e, "Failed to list guild roles"),
        }
    }

    if let Some(channel_id) = data.settings.discord.command_channel_id {
        let greeting = format!("<@{user_id}>, welcome to KoG!");
        if let Err(e) = serenity::ChannelId::new(channel_id)
            .say(&ctx.http, greeting)
            .await
        {
            warn!(error = %e, "Failed to post welcome message");
        }
    }
}
