//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**KoG Bot Help**\n\
        Link your Discord account to your King of Gores name and compare progress with other members.\n\n\
        **Registration**\n\
        • `/kog register <name>` - Claims a KoG name. A moderator reviews the request.\n\
        • `/kog withdraw` - Deletes your pending registration.\n\
        • `/kog unregister` - Removes your registered name and the member role.\n\n\
        **Queries**\n\
        • `/kog player_info <name>` - Shows rank, points and progress of a player.\n\
        • `/kog unfinished_maps <difficulty> [stars]` - Lists maps none of the selected members has finished.\n\n\
        **Owner Commands**\n\
        • `/kog update_all_user_data` - Refreshes every registered player now.\n\
        • `/kog update_map_data` - Refreshes the map catalog now.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
