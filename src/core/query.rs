//! Unfinished-map queries across several players.
//!
//! For every queried player the unfinished set is the catalog maps of the requested
//! difficulty minus the maps that player finished. A map is reported only when it is
//! in every player's unfinished set, i.e. nobody in the group has finished it.

use crate::{
    core::{map as map_catalog, map::Difficulty, player as player_store},
    entities::map,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// Most players one query may compare (one Discord select menu).
pub const MAX_QUERY_PLAYERS: usize = 25;

/// Returns the catalog maps of `difficulty` that none of `usernames` has finished.
///
/// The whole query fails with [`Error::PlayerNotFound`] if any username is not a
/// registered player; no partial result is produced. Maps keep their catalog order.
///
/// # Errors
/// - [`Error::NoPlayersSelected`] for an empty list
/// - [`Error::TooManyPlayers`] above [`MAX_QUERY_PLAYERS`]
/// - [`Error::PlayerNotFound`] for an unknown username
#[instrument(skip(db), fields(players = usernames.len()))]
pub async fn unfinished_maps_among(
    db: &DatabaseConnection,
    usernames: &[String],
    difficulty: Difficulty,
) -> Result<Vec<map::Model>> {
    if usernames.is_empty() {
        return Err(Error::NoPlayersSelected);
    }
    if usernames.len() > MAX_QUERY_PLAYERS {
        return Err(Error::TooManyPlayers {
            max: MAX_QUERY_PLAYERS,
        });
    }

    let catalog = map_catalog::get_maps_by_difficulty(db, difficulty).await?;

    let mut unfinished_sets = Vec::with_capacity(usernames.len());
    for username in usernames {
        let player = player_store::get_player_by_username(db, username)
            .await?
            .ok_or_else(|| Error::PlayerNotFound {
                username: username.clone(),
            })?;
        let completed = player_store::get_completed_map_names(db, player.id).await?;
        let unfinished: Vec<&map::Model> = catalog
            .iter()
            .filter(|m| !completed.contains(&m.name))
            .collect();
        unfinished_sets.push(unfinished);
    }

    let result = intersect_unfinished(&unfinished_sets, difficulty);
    info!(
        difficulty = %difficulty,
        maps = result.len(),
        "Unfinished maps computed"
    );
    Ok(result)
}

/// Intersects per-player unfinished lists by map name.
///
/// A name shared by several entries collapses to one output row carrying the first
/// entry's attributes, with the difficulty set to the queried one.
fn intersect_unfinished(sets: &[Vec<&map::Model>], difficulty: Difficulty) -> Vec<map::Model> {
    let mut order: Vec<&map::Model> = Vec::new();
    let mut presence: HashMap<&str, usize> = HashMap::new();

    for set in sets {
        let mut seen_in_set = HashSet::new();
        for &m in set {
            if !seen_in_set.insert(m.name.as_str()) {
                continue;
            }
            let count = presence.entry(m.name.as_str()).or_insert_with(|| {
                order.push(m);
                0
            });
            *count += 1;
        }
    }

    order
        .into_iter()
        .filter(|m| presence.get(m.name.as_str()) == Some(&sets.len()))
        .map(|m| map::Model {
            difficulty: difficulty.as_str().to_string(),
            ..m.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::map::upsert_maps;
    use crate::core::player::insert_player_with_snapshot;
    use crate::test_utils::*;

    fn names(maps: &[map::Model]) -> Vec<&str> {
        maps.iter().map(|m| m.name.as_str()).collect()
    }

    async fn setup_two_players() -> Result<DatabaseConnection> {
        let db = setup_test_db().await?;
        upsert_maps(&db, &sample_catalog()).await?;
        insert_player_with_snapshot(&db, "1", "A", &snapshot_with_maps(&["M1"])).await?;
        insert_player_with_snapshot(&db, "2", "B", &snapshot_with_maps(&["M2"])).await?;
        Ok(db)
    }

    #[tokio::test]
    async fn test_maps_nobody_finished() -> Result<()> {
        let db = setup_two_players().await?;

        let result = unfinished_maps_among(
            &db,
            &["A".to_string(), "B".to_string()],
            Difficulty::Hard,
        )
        .await?;
        assert_eq!(names(&result), vec!["M3"]);
        assert_eq!(result[0].difficulty, "Hard");

        Ok(())
    }

    #[tokio::test]
    async fn test_single_player_gets_own_unfinished_maps() -> Result<()> {
        let db = setup_two_players().await?;

        let result = unfinished_maps_among(&db, &["A".to_string()], Difficulty::Hard).await?;
        assert_eq!(names(&result), vec!["M2", "M3"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_other_difficulties_are_ignored() -> Result<()> {
        let db = setup_two_players().await?;

        let result = unfinished_maps_among(
            &db,
            &["A".to_string(), "B".to_string()],
            Difficulty::Easy,
        )
        .await?;
        assert_eq!(names(&result), vec!["E1"]);

        let result = unfinished_maps_among(&db, &["A".to_string()], Difficulty::Extreme).await?;
        assert!(result.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_player_fails_whole_query() -> Result<()> {
        let db = setup_two_players().await?;

        let result = unfinished_maps_among(
            &db,
            &["A".to_string(), "Ghost".to_string()],
            Difficulty::Hard,
        )
        .await;
        assert!(matches!(result, Err(Error::PlayerNotFound { username }) if username == "Ghost"));

        Ok(())
    }

    #[tokio::test]
    async fn test_player_count_limits() -> Result<()> {
        let db = setup_two_players().await?;

        let result = unfinished_maps_among(&db, &[], Difficulty::Hard).await;
        assert!(matches!(result, Err(Error::NoPlayersSelected)));

        let too_many: Vec<String> = (0..=MAX_QUERY_PLAYERS).map(|i| format!("p{i}")).collect();
        let result = unfinished_maps_among(&db, &too_many, Difficulty::Hard).await;
        assert!(matches!(result, Err(Error::TooManyPlayers { max: 25 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_same_player_twice_behaves_like_once() -> Result<()> {
        let db = setup_two_players().await?;

        let result =
            unfinished_maps_among(&db, &["A".to_string(), "A".to_string()], Difficulty::Hard)
                .await?;
        assert_eq!(names(&result), vec!["M2", "M3"]);

        Ok(())
    }

    #[test]
    fn test_intersection_collapses_duplicates_to_first_seen() {
        let first = map::Model {
            id: 1,
            name: "Dup".to_string(),
            difficulty: "Main".to_string(),
            stars: 2,
            points: 5,
            author: "first".to_string(),
            released_at: String::new(),
        };
        let second = map::Model {
            id: 2,
            author: "second".to_string(),
            ..first.clone()
        };
        let only_once = map::Model {
            id: 3,
            name: "Solo".to_string(),
            ..first.clone()
        };

        let sets = vec![vec![&first, &second, &only_once], vec![&second]];
        let result = intersect_unfinished(&sets, Difficulty::Hard);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].author, "first");
        assert_eq!(result[0].difficulty, "Hard");
    }
}
