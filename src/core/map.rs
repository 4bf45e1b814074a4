//! Map catalog business logic.
//!
//! The catalog is a mirror of the KoG website's map list. It is only written by the
//! refresh task, which upserts every listing by name; nothing patches single fields.

use crate::{
    entities::{Map, map},
    errors::Result,
    provider::MapListing,
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use std::fmt;
use tracing::{info, instrument};

/// Difficulty categories used by the KoG website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Entry-level maps
    Easy,
    /// Main progression maps
    Main,
    /// Hard maps
    Hard,
    /// Insane maps
    Insane,
    /// Extreme maps
    Extreme,
    /// Modified-physics maps
    Mod,
}

impl Difficulty {
    /// Every difficulty, in website order.
    pub const ALL: [Self; 6] = [
        Self::Easy,
        Self::Main,
        Self::Hard,
        Self::Insane,
        Self::Extreme,
        Self::Mod,
    ];

    /// Label as stored in the catalog.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Main => "Main",
            Self::Hard => "Hard",
            Self::Insane => "Insane",
            Self::Extreme => "Extreme",
            Self::Mod => "Mod",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieves all catalog maps of one difficulty, in catalog order.
pub async fn get_maps_by_difficulty<C>(db: &C, difficulty: Difficulty) -> Result<Vec<map::Model>>
where
    C: ConnectionTrait,
{
    Map::find()
        .filter(map::Column::Difficulty.eq(difficulty.as_str()))
        .order_by_asc(map::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the full catalog, in catalog order.
pub async fn get_all_maps<C>(db: &C) -> Result<Vec<map::Model>>
where
    C: ConnectionTrait,
{
    Map::find()
        .order_by_asc(map::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts or overwrites every listing, keyed by map name.
///
/// All columns of an existing row are replaced, so running this twice with the same
/// listings leaves the catalog unchanged. Returns the number of listings written.
#[instrument(skip(db, listings), fields(count = listings.len()))]
pub async fn upsert_maps(db: &DatabaseConnection, listings: &[MapListing]) -> Result<usize> {
    let txn = db.begin().await?;

    for listing in listings {
        let model = map::ActiveModel {
            name: Set(listing.name.clone()),
            difficulty: Set(listing.difficulty.clone()),
            stars: Set(listing.stars),
            points: Set(listing.points),
            author: Set(listing.author.clone()),
            released_at: Set(listing.released_at.clone()),
            ..Default::default()
        };

        Map::insert(model)
            .on_conflict(
                OnConflict::column(map::Column::Name)
                    .update_columns([
                        map::Column::Difficulty,
                        map::Column::Stars,
                        map::Column::Points,
                        map::Column::Author,
                        map::Column::ReleasedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
    }

    txn.commit().await?;
    info!("Map catalog upserted");
    Ok(listings.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_difficulty_display_matches_catalog_label() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.to_string(), difficulty.as_str());
        }
    }

    #[tokio::test]
    async fn test_upsert_maps_inserts_and_filters_by_difficulty() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_maps(&db, &sample_catalog()).await?;

        let hard = get_maps_by_difficulty(&db, Difficulty::Hard).await?;
        let names: Vec<&str> = hard.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["M1", "M2", "M3"]);

        let easy = get_maps_by_difficulty(&db, Difficulty::Easy).await?;
        assert_eq!(easy.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_maps_overwrites_existing_row() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_maps(&db, &[map_listing("M1", "Hard", 2, 10)]).await?;
        upsert_maps(&db, &[map_listing("M1", "Insane", 4, 25)]).await?;

        let all = get_all_maps(&db).await?;
        assert_eq!(all.len(), 1);
        let m1 = &all[0];
        assert_eq!(m1.name, "M1");
        assert_eq!(m1.difficulty, "Insane");
        assert_eq!(m1.stars, 4);
        assert_eq!(m1.points, 25);

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_maps_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = sample_catalog();

        upsert_maps(&db, &catalog).await?;
        let first = get_all_maps(&db).await?;
        upsert_maps(&db, &catalog).await?;
        let second = get_all_maps(&db).await?;

        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_empty_catalog() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(upsert_maps(&db, &[]).await?, 0);
        assert!(get_all_maps(&db).await?.is_empty());
        Ok(())
    }
}
