//! KoG Discord commands - registration, player lookups, unfinished-map queries and
//! manual refresh.
//!
//! Every command lives under the `/kog` parent command.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            components::{self, SelectionEvent},
            handlers::{autocomplete, moderation},
        },
        core::{
            map::Difficulty,
            player,
            query::{self, MAX_QUERY_PLAYERS},
            refresh, registration,
            report::{self, StarFilter},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::{fmt::Write, time::Duration};
    use tracing::{error, info, warn};

    /// How long the player selection stays interactive
    const SELECTION_TIMEOUT: Duration = Duration::from_secs(180);

    type Context<'a> = poise::Context<'a, BotData, Error>;

    /// Difficulty offered as a slash command choice.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum DifficultyChoice {
        Easy,
        Main,
        Hard,
        Insane,
        Extreme,
        Mod,
    }

    impl From<DifficultyChoice> for Difficulty {
        fn from(choice: DifficultyChoice) -> Self {
            match choice {
                DifficultyChoice::Easy => Self::Easy,
                DifficultyChoice::Main => Self::Main,
                DifficultyChoice::Hard => Self::Hard,
                DifficultyChoice::Insane => Self::Insane,
                DifficultyChoice::Extreme => Self::Extreme,
                DifficultyChoice::Mod => Self::Mod,
            }
        }
    }

    /// King of Gores commands.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands(
            "register",
            "withdraw",
            "unregister",
            "player_info",
            "unfinished_maps",
            "update_all_user_data",
            "update_map_data"
        ),
        subcommand_required
    )]
    #[allow(clippy::unused_async)]
    pub async fn kog(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Links your Discord account to your KoG name. A moderator reviews the request.
    #[poise::command(slash_command)]
    pub async fn register(
        ctx: Context<'_>,
        #[description = "Your exact name on KoG"] username: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        let data = ctx.data();
        let author_id = ctx.author().id.to_string();

        let pending = registration::register(&data.database, &author_id, &username).await?;

        let snapshot = match data.provider.fetch_player(&pending.claimed_username).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(username = %pending.claimed_username, error = %e, "Could not confirm registered name");
                None
            }
        };

        let posted = match data.settings.discord.log_channel_id {
            Some(channel_id) => {
                let message = components::registration_log_message(
                    &pending,
                    snapshot.as_ref(),
                    &data.settings.provider.base_url,
                );
                // The registration is already stored; the registrant can still withdraw it
                if let Err(e) = serenity::ChannelId::new(channel_id)
                    .send_message(&ctx.serenity_context().http, message)
                    .await
                {
                    error!(registration_id = %pending.id, error = %e, "Failed to post registration for review");
                    false
                } else {
                    true
                }
            }
            None => {
                warn!("No log channel configured, registration not posted for review");
                false
            }
        };

        let content =
            components::registration_reply(&pending.claimed_username, snapshot.is_some(), posted);
        let reply = if snapshot.is_some() {
            poise::CreateReply::default().content(content)
        } else {
            poise::CreateReply::default()
                .content(content)
                .components(vec![components::withdraw_row(&pending.id)])
        };
        ctx.send(reply.ephemeral(true)).await?;
        Ok(())
    }

    /// Deletes your pending registration.
    #[poise::command(slash_command)]
    pub async fn withdraw(ctx: Context<'_>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        let db = &ctx.data().database;
        let author_id = ctx.author().id.to_string();

        let Some(pending) = registration::get_pending_registration_for_user(db, &author_id).await?
        else {
            ctx.say("ℹ️ You have no pending registration.").await?;
            return Ok(());
        };

        registration::delete_registration(db, &author_id, &pending.id).await?;
        ctx.say(format!(
            "🗑️ Registration for **{}** withdrawn. You can register again.",
            pending.claimed_username
        ))
        .await?;
        Ok(())
    }

    /// Removes your registered KoG name and the member role.
    #[poise::command(slash_command)]
    pub async fn unregister(ctx: Context<'_>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        let data = ctx.data();
        let author = ctx.author().id;

        let removed = registration::unregister(&data.database, &author.to_string()).await?;

        if let Some(guild_id) = ctx.guild_id() {
            let http = &ctx.serenity_context().http;
            let role_name = &data.settings.discord.member_role_name;
            if let Some(role_id) = moderation::find_member_role(http, guild_id, role_name).await? {
                http.remove_member_role(guild_id, author, role_id, Some("KoG unregister"))
                    .await?;
            }
        }

        ctx.say(format!("✅ Unregistered **{}**.", removed.username))
            .await?;
        Ok(())
    }

    /// Shows rank, points and map progress of a KoG player.
    #[poise::command(slash_command)]
    pub async fn player_info(
        ctx: Context<'_>,
        #[description = "KoG name"]
        #[autocomplete = "autocomplete::autocomplete_player_name"]
        username: String,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();

        let info =
            player::lookup_player_info(&data.database, data.provider.as_ref(), username.trim())
                .await?;

        let mut embed = serenity::CreateEmbed::new()
            .title(format!("🏁 {}", info.username))
            .description(report::format_player_info(&info)?)
            .color(components::COLOR_PENDING);
        if let Some(url) = components::profile_url(&data.settings.provider.base_url, &info.username)
        {
            embed = embed.url(url.as_str());
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Replies ephemerally and returns `false` outside the configured command channel.
    async fn ensure_command_channel(ctx: Context<'_>) -> Result<bool> {
        let Some(channel_id) = ctx.data().settings.discord.command_channel_id else {
            return Ok(true);
        };
        if ctx.channel_id().get() == channel_id {
            return Ok(true);
        }
        ctx.send(
            poise::CreateReply::default()
                .content(format!("Please use this command in <#{channel_id}>."))
                .ephemeral(true),
        )
        .await?;
        Ok(false)
    }

    /// Runs the interactive player selection. Returns the chosen players and whether the
    /// results are private, or `None` when the selection timed out.
    async fn collect_player_selection(
        ctx: Context<'_>,
        difficulty: Difficulty,
        filter: StarFilter,
        registered: &[String],
    ) -> Result<Option<(Vec<String>, bool)>> {
        let nonce = ctx.id();
        let http = &ctx.serenity_context().http;
        let mut selected: Vec<String> = Vec::new();
        let mut page = 0;

        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .content(components::selection_content(difficulty.as_str(), filter, &selected))
                    .components(components::selection_components(
                        nonce, registered, &selected, page,
                    ))
                    .ephemeral(true),
            )
            .await?;

        loop {
            let prefix = components::selection_prefix(nonce);
            let Some(mci) = serenity::ComponentInteractionCollector::new(ctx.serenity_context())
                .author_id(ctx.author().id)
                .channel_id(ctx.channel_id())
                .timeout(SELECTION_TIMEOUT)
                .filter(move |mci| mci.data.custom_id.starts_with(&prefix))
                .await
            else {
                handle
                    .edit(
                        ctx,
                        poise::CreateReply::default()
                            .content("⌛ Player selection timed out.")
                            .components(vec![]),
                    )
                    .await?;
                return Ok(None);
            };

            let submit = match components::parse_selection_custom_id(nonce, &mci.data.custom_id) {
                Some(SelectionEvent::Pick) => {
                    if let serenity::ComponentInteractionDataKind::StringSelect { values } =
                        &mci.data.kind
                    {
                        for value in values {
                            if selected.len() < MAX_QUERY_PLAYERS && !selected.contains(value) {
                                selected.push(value.clone());
                            }
                        }
                    }
                    None
                }
                Some(SelectionEvent::PreviousPage) => {
                    page = page.saturating_sub(1);
                    None
                }
                Some(SelectionEvent::NextPage) => {
                    page += 1;
                    None
                }
                Some(SelectionEvent::SubmitPublic) => Some(false),
                Some(SelectionEvent::SubmitPrivate) => Some(true),
                None => continue,
            };

            let Some(private) = submit else {
                page = page.min(components::selection_page_count(registered, &selected) - 1);
                mci.create_response(
                    http,
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new()
                            .content(components::selection_content(
                                difficulty.as_str(),
                                filter,
                                &selected,
                            ))
                            .components(components::selection_components(
                                nonce, registered, &selected, page,
                            )),
                    ),
                )
                .await?;
                continue;
            };

            mci.create_response(
                http,
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .content("✅ Query complete.")
                        .components(vec![]),
                ),
            )
            .await?;
            return Ok(Some((selected, private)));
        }
    }

    /// Lists maps of a difficulty that none of the selected members has finished.
    #[poise::command(slash_command)]
    pub async fn unfinished_maps(
        ctx: Context<'_>,
        #[description = "Map difficulty"] difficulty: DifficultyChoice,
        #[description = "Only maps with this many stars (0 or empty = any)"]
        #[min = 0]
        #[max = 5]
        stars: Option<u8>,
    ) -> Result<()> {
        if !ensure_command_channel(ctx).await? {
            return Ok(());
        }

        let db = &ctx.data().database;
        let author_id = ctx.author().id;
        if player::get_player_by_discord_id(db, &author_id.to_string())
            .await?
            .is_none()
        {
            return Err(Error::NotRegistered);
        }

        let difficulty = Difficulty::from(difficulty);
        let filter = StarFilter::from_stars(stars.unwrap_or(0));
        let registered = player::get_registered_usernames(db).await?;

        let Some((selected, private)) =
            collect_player_selection(ctx, difficulty, filter, &registered).await?
        else {
            return Ok(());
        };

        let maps = query::unfinished_maps_among(db, &selected, difficulty).await?;
        let maps = report::arrange_for_display(maps, filter);
        info!(
            players = selected.len(),
            maps = maps.len(),
            private,
            "Unfinished map query answered"
        );

        let mut header = format!("<@{author_id}> unfinished maps between players\n```\n");
        writeln!(
            header,
            "{}",
            components::selection_content(difficulty.as_str(), filter, &selected)
        )?;
        header.push_str("```");
        ctx.send(
            poise::CreateReply::default()
                .content(header)
                .ephemeral(private),
        )
        .await?;

        let chunks = report::chunk_map_lines(&maps);
        if chunks.is_empty() {
            ctx.send(
                poise::CreateReply::default()
                    .content("🎉 Every map matching the filter was finished by someone in the group.")
                    .ephemeral(private),
            )
            .await?;
        }
        for chunk in chunks {
            ctx.send(
                poise::CreateReply::default()
                    .content(chunk)
                    .ephemeral(private),
            )
            .await?;
        }
        Ok(())
    }

    /// (Owner only) Refreshes every registered player now.
    #[poise::command(slash_command, owners_only)]
    pub async fn update_all_user_data(ctx: Context<'_>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();

        let summary = refresh::update_all_user_data(
            &data.database,
            data.provider.as_ref(),
            data.settings.refresh.concurrency,
        )
        .await?;

        ctx.say(report::format_refresh_summary(&summary)?).await?;
        Ok(())
    }

    /// (Owner only) Refreshes the map catalog now.
    #[poise::command(slash_command, owners_only)]
    pub async fn update_map_data(ctx: Context<'_>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();

        let count = refresh::update_map_data(&data.database, data.provider.as_ref()).await?;
        ctx.say(format!("✅ Map data updated: {count} maps.")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
