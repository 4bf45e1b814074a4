//! Map entity - One entry of the KoG map catalog.
//!
//! Keyed by map name; the nightly refresh upserts every row from the website.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Map catalog database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "maps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Map name, unique across the catalog
    #[sea_orm(unique)]
    pub name: String,
    /// Difficulty label (`Easy`, `Main`, `Hard`, `Insane`, `Extreme`, `Mod`)
    pub difficulty: String,
    /// Star rating from 0 to 5
    pub stars: i32,
    /// Points awarded for finishing the map
    pub points: i32,
    /// Map author(s)
    pub author: String,
    /// Release time as shown on the KoG website
    pub released_at: String,
}

/// `Map` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
