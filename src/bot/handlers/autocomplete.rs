//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::player, errors::Error};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Suggests registered KoG usernames containing the partial input.
///
/// Matching is case-insensitive; results are sorted alphabetically.
pub async fn autocomplete_player_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(usernames) = player::get_registered_usernames(db).await else {
        return Vec::new();
    };

    filter_suggestions(usernames, partial)
}

fn filter_suggestions(usernames: Vec<String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    usernames
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_suggestions_case_insensitive() {
        let names = vec!["Cheeser".to_string(), "cheese".to_string(), "Bob".to_string()];
        assert_eq!(filter_suggestions(names, "CHEE"), vec!["Cheeser", "cheese"]);
    }

    #[test]
    fn test_filter_suggestions_limited() {
        let names: Vec<String> = (0..40).map(|i| format!("p{i}")).collect();
        assert_eq!(filter_suggestions(names, "").len(), MAX_SUGGESTIONS);
    }
}
