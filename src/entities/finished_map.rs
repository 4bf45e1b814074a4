//! Finished map entity - One map completion in a player's snapshot.
//!
//! Rows are never patched individually: the whole set for a player is deleted and
//! re-inserted whenever the snapshot is refreshed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Finished map database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "finished_maps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning player
    pub player_id: i64,
    /// Name of the completed map
    pub map_name: String,
    /// Best completion time in seconds
    pub time: f64,
    /// Completion timestamp as reported by the KoG website
    pub finished_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::player::Entity",
        from = "Column::PlayerId",
        to = "super::player::Column::Id",
        on_delete = "Cascade"
    )]
    Player,
}

impl Related<super::player::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Player.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
