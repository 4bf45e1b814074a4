//! Text rendering for query results and player summaries.
//!
//! These helpers are framework-agnostic: they return plain strings that the bot layer
//! places into messages and embeds.

use crate::{
    core::{
        player::{InfoSource, PlayerInfo},
        refresh::RefreshSummary,
    },
    entities::map,
    errors::Result,
};
use std::fmt::Write;

/// Highest star rating on the KoG website.
pub const MAX_STARS: u8 = 5;

/// Map lines per result message.
pub const MAPS_PER_MESSAGE: usize = 30;

/// Failed players listed by name in a refresh summary.
pub const MAX_LISTED_FAILURES: usize = 10;

/// Longest failure reason shown per player.
const MAX_REASON_CHARS: usize = 100;

const FILLED_STAR: char = '★';
const EMPTY_STAR: char = '☆';

/// Star filter chosen for an unfinished-map query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarFilter {
    /// Every star rating, sorted by stars
    Any,
    /// Only maps with exactly this many stars
    Exactly(u8),
}

impl StarFilter {
    /// Builds a filter from a star count where 0 means "not limited".
    #[must_use]
    pub fn from_stars(stars: u8) -> Self {
        match stars {
            0 => Self::Any,
            n => Self::Exactly(n.min(MAX_STARS)),
        }
    }

    /// Text shown to the user for this filter.
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::Any => "not limited".to_string(),
            Self::Exactly(n) => render_star_rating(i32::from(n)),
        }
    }
}

/// Renders a star rating as five symbols, e.g. `★★★☆☆` for 3.
///
/// Values outside `0..=5` are clamped.
#[must_use]
pub fn render_star_rating(stars: i32) -> String {
    let filled = usize::try_from(stars.clamp(0, i32::from(MAX_STARS))).unwrap_or(0);
    let total = usize::from(MAX_STARS);
    std::iter::repeat_n(FILLED_STAR, filled)
        .chain(std::iter::repeat_n(EMPTY_STAR, total - filled))
        .collect()
}

/// Applies the star filter to a query result.
///
/// With [`StarFilter::Any`] maps are sorted by ascending stars (stable, so catalog order
/// is kept within a rating); otherwise only maps with the exact rating remain.
#[must_use]
pub fn arrange_for_display(mut maps: Vec<map::Model>, filter: StarFilter) -> Vec<map::Model> {
    match filter {
        StarFilter::Any => {
            maps.sort_by_key(|m| m.stars);
            maps
        }
        StarFilter::Exactly(n) => {
            maps.retain(|m| m.stars == i32::from(n));
            maps
        }
    }
}

/// Formats one result line as `★★★☆☆(points) name`.
#[must_use]
pub fn format_map_line(map: &map::Model) -> String {
    format!(
        "{}({}) {}",
        render_star_rating(map.stars),
        map.points,
        map.name
    )
}

/// Splits a result into message bodies of at most [`MAPS_PER_MESSAGE`] lines.
#[must_use]
pub fn chunk_map_lines(maps: &[map::Model]) -> Vec<String> {
    maps.chunks(MAPS_PER_MESSAGE)
        .map(|chunk| {
            chunk
                .iter()
                .map(format_map_line)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

/// Formats a numbered player list, one `N. name` per line.
#[must_use]
pub fn format_player_list(players: &[String]) -> String {
    players
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {p}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats the body of the player info embed.
pub fn format_player_info(info: &PlayerInfo) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "**Rank:** {}", info.rank)?;
    writeln!(
        out,
        "**Points:** {} ({} + {})",
        info.total_points, info.base_points, info.season_points
    )?;
    writeln!(out, "**Finished maps:** {}", info.finished_count)?;
    if let Some(discord_user_id) = &info.discord_user_id {
        writeln!(out, "**Member:** <@{discord_user_id}>")?;
    }

    let known: Vec<_> = info.progress.iter().filter(|p| p.total > 0).collect();
    if !known.is_empty() {
        writeln!(out)?;
        for p in known {
            writeln!(out, "{}: {}/{}", p.difficulty, p.finished, p.total)?;
        }
    }

    if info.source == InfoSource::Live {
        writeln!(out, "\n_Not registered here, fetched live from KoG._")?;
    }
    Ok(out)
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

/// Formats the reply to a manual player refresh.
///
/// Only the first [`MAX_LISTED_FAILURES`] failures are listed and long reasons are cut,
/// so a website outage still fits in one Discord message.
pub fn format_refresh_summary(summary: &RefreshSummary) -> Result<String> {
    let mut out = format!(
        "✅ Player data updated: {} updated, {} skipped, {} failed.",
        summary.updated,
        summary.skipped,
        summary.failed.len()
    );
    for (username, reason) in summary.failed.iter().take(MAX_LISTED_FAILURES) {
        write!(out, "\n• {username}: {}", shorten(reason, MAX_REASON_CHARS))?;
    }
    let hidden = summary.failed.len().saturating_sub(MAX_LISTED_FAILURES);
    if hidden > 0 {
        write!(out, "\n…and {hidden} more")?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::map::Difficulty;
    use crate::core::player::DifficultyProgress;
    use rstest::rstest;

    fn map_with(name: &str, stars: i32, points: i32) -> map::Model {
        map::Model {
            id: 0,
            name: name.to_string(),
            difficulty: "Hard".to_string(),
            stars,
            points,
            author: "someone".to_string(),
            released_at: String::new(),
        }
    }

    #[rstest]
    #[case(0, "☆☆☆☆☆")]
    #[case(1, "★☆☆☆☆")]
    #[case(3, "★★★☆☆")]
    #[case(5, "★★★★★")]
    #[case(9, "★★★★★")]
    #[case(-2, "☆☆☆☆☆")]
    fn test_render_star_rating(#[case] stars: i32, #[case] expected: &str) {
        assert_eq!(render_star_rating(stars), expected);
    }

    #[test]
    fn test_zero_star_filter_is_not_limited() {
        assert_eq!(StarFilter::from_stars(0), StarFilter::Any);
        assert_eq!(StarFilter::from_stars(0).label(), "not limited");
        assert_eq!(StarFilter::from_stars(3).label(), "★★★☆☆");
        assert_eq!(StarFilter::from_stars(7), StarFilter::Exactly(5));
    }

    #[test]
    fn test_arrange_any_sorts_by_stars_stably() {
        let maps = vec![map_with("b", 3, 1), map_with("a", 1, 1), map_with("c", 3, 1)];
        let arranged = arrange_for_display(maps, StarFilter::Any);
        let names: Vec<&str> = arranged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_arrange_exact_filters() {
        let maps = vec![map_with("b", 3, 1), map_with("a", 1, 1), map_with("c", 3, 1)];
        let arranged = arrange_for_display(maps, StarFilter::Exactly(3));
        let names: Vec<&str> = arranged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_format_map_line() {
        assert_eq!(format_map_line(&map_with("Aip-Gores", 2, 15)), "★★☆☆☆(15) Aip-Gores");
    }

    #[test]
    fn test_chunk_map_lines_splits_every_thirty() {
        let maps: Vec<map::Model> = (0..65).map(|i| map_with(&format!("m{i}"), 1, 1)).collect();
        let chunks = chunk_map_lines(&maps);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].lines().count(), 30);
        assert_eq!(chunks[2].lines().count(), 5);
        assert!(chunk_map_lines(&[]).is_empty());
    }

    #[test]
    fn test_format_player_list() {
        let players = vec!["Alice".to_string(), "Bob".to_string()];
        assert_eq!(format_player_list(&players), "1. Alice\n2. Bob");
    }

    #[test]
    fn test_format_player_info_live() {
        let info = PlayerInfo {
            username: "Visitor".to_string(),
            discord_user_id: None,
            rank: 7,
            total_points: 150,
            base_points: 100,
            season_points: 50,
            finished_count: 4,
            progress: vec![
                DifficultyProgress {
                    difficulty: Difficulty::Hard,
                    finished: 2,
                    total: 3,
                },
                DifficultyProgress {
                    difficulty: Difficulty::Mod,
                    finished: 0,
                    total: 0,
                },
            ],
            source: InfoSource::Live,
        };

        let text = format_player_info(&info).unwrap();
        assert!(text.contains("**Points:** 150 (100 + 50)"));
        assert!(text.contains("Hard: 2/3"));
        assert!(!text.contains("Mod:"));
        assert!(text.contains("fetched live"));
    }

    #[test]
    fn test_refresh_summary_lists_few_failures() {
        let summary = RefreshSummary {
            updated: 3,
            skipped: 1,
            failed: vec![("Alice".to_string(), "timed out".to_string())],
        };
        let text = format_refresh_summary(&summary).unwrap();
        assert_eq!(
            text,
            "✅ Player data updated: 3 updated, 1 skipped, 1 failed.\n• Alice: timed out"
        );
    }

    #[test]
    fn test_refresh_summary_stays_short_during_outage() {
        let reason = format!("error sending request for url (https://kog.tw/api.php): {}", "x".repeat(200));
        let failed = (0..60)
            .map(|i| (format!("player{i:02}"), reason.clone()))
            .collect();
        let summary = RefreshSummary {
            updated: 0,
            skipped: 0,
            failed,
        };

        let text = format_refresh_summary(&summary).unwrap();
        assert!(text.chars().count() < 2000);
        assert_eq!(text.matches("\n• ").count(), MAX_LISTED_FAILURES);
        assert!(text.ends_with("…and 50 more"));
        assert!(text.contains("player09"));
        assert!(!text.contains("player10"));
    }
}
