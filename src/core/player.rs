//! Player business logic - lookups and snapshot writes for registered players.
//!
//! Players are created only by approving a registration (see
//! [`crate::core::registration`]) and their point/completion snapshot is replaced
//! wholesale by the refresh task. Completed maps are stored one row per map and are
//! always rewritten as a set.

use crate::{
    core::{map::Difficulty, unique_violation},
    entities::{FinishedMap, Map, Player, finished_map, player},
    errors::{Error, Result},
    provider::{KogProvider, PlayerSnapshot},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Rows per `INSERT` when writing finished maps.
const FINISHED_MAP_BATCH: usize = 200;

/// Finds the player owned by a Discord user.
pub async fn get_player_by_discord_id<C>(
    db: &C,
    discord_user_id: &str,
) -> Result<Option<player::Model>>
where
    C: ConnectionTrait,
{
    Player::find()
        .filter(player::Column::DiscordUserId.eq(discord_user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a player by KoG username (exact, case-sensitive match).
pub async fn get_player_by_username<C>(db: &C, username: &str) -> Result<Option<player::Model>>
where
    C: ConnectionTrait,
{
    Player::find()
        .filter(player::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every registered player, ordered by username.
pub async fn get_all_players<C>(db: &C) -> Result<Vec<player::Model>>
where
    C: ConnectionTrait,
{
    Player::find()
        .order_by_asc(player::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the KoG usernames of every registered player, ordered alphabetically.
pub async fn get_registered_usernames<C>(db: &C) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    Player::find()
        .select_only()
        .column(player::Column::Username)
        .order_by_asc(player::Column::Username)
        .into_tuple::<String>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Names of every map a player has finished.
pub async fn get_completed_map_names<C>(db: &C, player_id: i64) -> Result<HashSet<String>>
where
    C: ConnectionTrait,
{
    let names = FinishedMap::find()
        .select_only()
        .column(finished_map::Column::MapName)
        .filter(finished_map::Column::PlayerId.eq(player_id))
        .into_tuple::<String>()
        .all(db)
        .await?;
    Ok(names.into_iter().collect())
}

async fn insert_finished_maps<C>(db: &C, player_id: i64, snapshot: &PlayerSnapshot) -> Result<()>
where
    C: ConnectionTrait,
{
    for chunk in snapshot.completed_maps.chunks(FINISHED_MAP_BATCH) {
        let rows = chunk.iter().map(|m| finished_map::ActiveModel {
            player_id: Set(player_id),
            map_name: Set(m.map_name.clone()),
            time: Set(m.time),
            finished_at: Set(m.finished_at.clone()),
            ..Default::default()
        });
        FinishedMap::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Inserts a new player together with its snapshot.
///
/// Meant to run inside the approval transaction. Unique-index violations are reported
/// as [`Error::NameTaken`] (KoG name) or [`Error::AlreadyRegistered`] (Discord user).
pub async fn insert_player_with_snapshot<C>(
    db: &C,
    discord_user_id: &str,
    username: &str,
    snapshot: &PlayerSnapshot,
) -> Result<player::Model>
where
    C: ConnectionTrait,
{
    let model = player::ActiveModel {
        discord_user_id: Set(discord_user_id.to_string()),
        username: Set(username.to_string()),
        rank: Set(snapshot.rank),
        total_points: Set(snapshot.total_points),
        base_points: Set(snapshot.base_points),
        season_points: Set(snapshot.season_points),
        updated_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let player = model.insert(db).await.map_err(|e| match unique_violation(&e) {
        Some(message) if message.contains("username") => Error::NameTaken {
            username: username.to_string(),
        },
        Some(_) => Error::AlreadyRegistered,
        None => e.into(),
    })?;

    insert_finished_maps(db, player.id, snapshot).await?;
    Ok(player)
}

/// Replaces a player's points and finished maps with a fresh snapshot.
///
/// Returns `None` when no player with this username exists any more (for example
/// when the member unregistered while the refresh was running).
#[instrument(skip(db, snapshot))]
pub async fn replace_snapshot(
    db: &DatabaseConnection,
    username: &str,
    snapshot: &PlayerSnapshot,
) -> Result<Option<player::Model>> {
    let txn = db.begin().await?;

    let Some(existing) = get_player_by_username(&txn, username).await? else {
        return Ok(None);
    };

    let mut active: player::ActiveModel = existing.into();
    active.rank = Set(snapshot.rank);
    active.total_points = Set(snapshot.total_points);
    active.base_points = Set(snapshot.base_points);
    active.season_points = Set(snapshot.season_points);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&txn).await?;

    FinishedMap::delete_many()
        .filter(finished_map::Column::PlayerId.eq(updated.id))
        .exec(&txn)
        .await?;
    insert_finished_maps(&txn, updated.id, snapshot).await?;

    txn.commit().await?;
    info!(
        finished_maps = snapshot.completed_maps.len(),
        "Player snapshot replaced"
    );
    Ok(Some(updated))
}

/// Deletes the player owned by a Discord user, with its finished maps.
///
/// # Errors
/// [`Error::NotRegistered`] if the user owns no player.
pub async fn delete_player_by_discord_id(
    db: &DatabaseConnection,
    discord_user_id: &str,
) -> Result<player::Model> {
    let txn = db.begin().await?;

    let player = get_player_by_discord_id(&txn, discord_user_id)
        .await?
        .ok_or(Error::NotRegistered)?;

    FinishedMap::delete_many()
        .filter(finished_map::Column::PlayerId.eq(player.id))
        .exec(&txn)
        .await?;
    Player::delete_by_id(player.id).exec(&txn).await?;

    txn.commit().await?;
    Ok(player)
}

/// Where the figures of a [`PlayerInfo`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoSource {
    /// Stored snapshot of a registered player
    Registered,
    /// Fetched live because the player is not registered here
    Live,
}

/// Finished versus total catalog maps of one difficulty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyProgress {
    /// Difficulty being counted
    pub difficulty: Difficulty,
    /// Catalog maps of this difficulty the player finished
    pub finished: usize,
    /// Catalog maps of this difficulty
    pub total: usize,
}

/// Summary shown by the player info command.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    /// KoG username
    pub username: String,
    /// Owning Discord user, when registered
    pub discord_user_id: Option<String>,
    /// Global rank
    pub rank: i32,
    /// Total points
    pub total_points: i32,
    /// Points outside the current season
    pub base_points: i32,
    /// Points earned this season
    pub season_points: i32,
    /// Number of finished maps
    pub finished_count: usize,
    /// Per-difficulty completion against the local catalog
    pub progress: Vec<DifficultyProgress>,
    /// Stored or live data
    pub source: InfoSource,
}

async fn progress_against_catalog(
    db: &DatabaseConnection,
    completed: &HashSet<String>,
) -> Result<Vec<DifficultyProgress>> {
    let catalog = Map::find().all(db).await?;
    Ok(Difficulty::ALL
        .into_iter()
        .map(|difficulty| {
            let maps = catalog
                .iter()
                .filter(|m| m.difficulty == difficulty.as_str());
            let (total, finished) = maps.fold((0, 0), |(total, finished), m| {
                (total + 1, finished + usize::from(completed.contains(&m.name)))
            });
            DifficultyProgress {
                difficulty,
                finished,
                total,
            }
        })
        .collect())
}

/// Looks up a player's points and progress.
///
/// Registered players are answered from the stored snapshot; anyone else is fetched
/// from the KoG website without being stored.
#[instrument(skip(db, provider))]
pub async fn lookup_player_info(
    db: &DatabaseConnection,
    provider: &dyn KogProvider,
    username: &str,
) -> Result<PlayerInfo> {
    if let Some(player) = get_player_by_username(db, username).await? {
        let completed = get_completed_map_names(db, player.id).await?;
        let progress = progress_against_catalog(db, &completed).await?;
        return Ok(PlayerInfo {
            username: player.username,
            discord_user_id: Some(player.discord_user_id),
            rank: player.rank,
            total_points: player.total_points,
            base_points: player.base_points,
            season_points: player.season_points,
            finished_count: completed.len(),
            progress,
            source: InfoSource::Registered,
        });
    }

    let snapshot = provider.fetch_player(username).await.map_err(|e| match e {
        crate::provider::ProviderError::NotFound { .. } => Error::PlayerNotFound {
            username: username.to_string(),
        },
        other => other.into(),
    })?;
    let completed: HashSet<String> = snapshot
        .completed_maps
        .iter()
        .map(|m| m.map_name.clone())
        .collect();
    let progress = progress_against_catalog(db, &completed).await?;

    Ok(PlayerInfo {
        username: username.to_string(),
        discord_user_id: None,
        rank: snapshot.rank,
        total_points: snapshot.total_points,
        base_points: snapshot.base_points,
        season_points: snapshot.season_points,
        finished_count: completed.len(),
        progress,
        source: InfoSource::Live,
    })
}
