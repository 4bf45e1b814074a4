//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod finished_map;
pub mod map;
pub mod player;
pub mod registration;

// Re-export specific types to avoid conflicts
pub use finished_map::{
    Column as FinishedMapColumn, Entity as FinishedMap, Model as FinishedMapModel,
};
pub use map::{Column as MapColumn, Entity as Map, Model as MapModel};
pub use player::{Column as PlayerColumn, Entity as Player, Model as PlayerModel};
pub use registration::{
    Column as RegistrationColumn, Entity as Registration, Model as RegistrationModel,
};
