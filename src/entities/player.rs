//! Player entity - A Discord member whose KoG account has been approved.
//!
//! Both the Discord user id and the KoG username are unique, so a Discord account
//! owns at most one player and a KoG name is claimed by at most one member.
//! Point columns are a snapshot from the KoG website, replaced by the nightly refresh.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Player database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "players")]
pub struct Model {
    /// Unique identifier for the player
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID of the owning member
    #[sea_orm(unique)]
    pub discord_user_id: String,
    /// Username on the KoG website
    #[sea_orm(unique)]
    pub username: String,
    /// Global rank on the KoG website
    pub rank: i32,
    /// Total points (`base_points` + `season_points`)
    pub total_points: i32,
    /// Points outside the current season
    pub base_points: i32,
    /// Points earned this season
    pub season_points: i32,
    /// When the snapshot was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Player and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One player has many finished maps
    #[sea_orm(has_many = "super::finished_map::Entity")]
    FinishedMaps,
}

impl Related<super::finished_map::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinishedMaps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
