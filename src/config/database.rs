//! Database configuration module for the KoG bot.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`.
//! Uniqueness rules that the workflow relies on (one player per Discord user, one player
//! per KoG name, one pending registration per Discord user) are enforced here as indexes,
//! so concurrent registrations cannot slip past the application-level checks.

use crate::entities::{FinishedMap, Map, Player, Registration};
use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/kog_bot.sqlite?mode=rwc";

/// At most one undecided registration per Discord user.
const PENDING_REGISTRATION_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
    idx_registrations_pending_user ON registrations (discord_user_id) WHERE approved IS NULL";

const FINISHED_MAPS_PLAYER_INDEX: &str = "CREATE INDEX IF NOT EXISTS \
    idx_finished_maps_player ON finished_maps (player_id)";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_sqlite_dir(&database_url)?;
    info!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// `SQLite` creates the file with `mode=rwc` but not its directory.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::Config {
            message: format!("Failed to create database directory {}: {e}", parent.display()),
        })?;
    }
    Ok(())
}

async fn create_table_for<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Creates all tables and uniqueness indexes if they do not exist yet.
///
/// Safe to call on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, Player).await?;
    create_table_for(db, &schema, FinishedMap).await?;
    create_table_for(db, &schema, Map).await?;
    create_table_for(db, &schema, Registration).await?;

    db.execute_unprepared(PENDING_REGISTRATION_INDEX).await?;
    db.execute_unprepared(FINISHED_MAPS_PLAYER_INDEX).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FinishedMapModel, MapModel, PlayerModel, RegistrationModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<PlayerModel> = Player::find().limit(1).all(&db).await?;
        let _: Vec<FinishedMapModel> = FinishedMap::find().limit(1).all(&db).await?;
        let _: Vec<MapModel> = Map::find().limit(1).all(&db).await?;
        let _: Vec<RegistrationModel> = Registration::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_pending_index_rejects_second_pending_row() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        db.execute_unprepared(
            "INSERT INTO registrations (id, discord_user_id, claimed_username, created_at) \
             VALUES ('a', '42', 'one', '2024-01-01 00:00:00')",
        )
        .await?;
        let second = db
            .execute_unprepared(
                "INSERT INTO registrations (id, discord_user_id, claimed_username, created_at) \
                 VALUES ('b', '42', 'two', '2024-01-01 00:00:00')",
            )
            .await;
        assert!(second.is_err());

        // A decided registration does not count towards the pending limit
        db.execute_unprepared("UPDATE registrations SET approved = 0 WHERE id = 'a'")
            .await?;
        db.execute_unprepared(
            "INSERT INTO registrations (id, discord_user_id, claimed_username, created_at) \
             VALUES ('c', '42', 'three', '2024-01-01 00:00:00')",
        )
        .await?;

        Ok(())
    }
}
