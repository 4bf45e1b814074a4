//! Registration workflow - the moderation state machine for new members.
//!
//! A Discord user moves through `Unregistered -> Pending -> Approved | Rejected | Deleted`.
//! Approval is terminal and creates the player; rejection and deletion leave the user
//! free to register again. The application-level checks below give friendly errors
//! early, but the unique indexes created in [`crate::config::database`] are what make
//! the rules hold under concurrent requests.

use crate::{
    core::{player as player_store, unique_violation},
    entities::{Registration, player, registration},
    errors::{Error, Result},
    provider::KogProvider,
};
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument, warn};

/// Longest KoG username accepted.
const MAX_USERNAME_LEN: usize = 64;

/// Result of a successful approval.
#[derive(Debug, Clone)]
pub struct ApprovedRegistration {
    /// The registration, now marked approved
    pub registration: registration::Model,
    /// The player created from it
    pub player: player::Model,
}

fn validate_username(claimed_username: &str) -> Result<String> {
    let name = claimed_username.trim();
    if name.is_empty() {
        return Err(Error::InvalidUsername {
            message: "name cannot be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::InvalidUsername {
            message: format!("name cannot be longer than {MAX_USERNAME_LEN} characters"),
        });
    }
    if name.chars().any(char::is_control) {
        return Err(Error::InvalidUsername {
            message: "name cannot contain control characters".to_string(),
        });
    }
    Ok(name.to_string())
}

/// Finds a registration by id.
pub async fn get_registration<C>(db: &C, registration_id: &str) -> Result<Option<registration::Model>>
where
    C: ConnectionTrait,
{
    Registration::find_by_id(registration_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the undecided registration of a Discord user, if any.
pub async fn get_pending_registration_for_user<C>(
    db: &C,
    discord_user_id: &str,
) -> Result<Option<registration::Model>>
where
    C: ConnectionTrait,
{
    Registration::find()
        .filter(registration::Column::DiscordUserId.eq(discord_user_id))
        .filter(registration::Column::Approved.is_null())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Records a new pending registration.
///
/// The KoG website is not contacted here; the caller confirms the name separately
/// to decide how to present the request to moderators.
///
/// # Errors
/// - [`Error::InvalidUsername`] for an empty or oversized name
/// - [`Error::AlreadyRegistered`] if the user already owns a player
/// - [`Error::PendingExists`] if the user already has an undecided registration
/// - [`Error::NameTaken`] if a player already uses the name
#[instrument(skip(db))]
pub async fn register(
    db: &DatabaseConnection,
    discord_user_id: &str,
    claimed_username: &str,
) -> Result<registration::Model> {
    let username = validate_username(claimed_username)?;

    if player_store::get_player_by_discord_id(db, discord_user_id)
        .await?
        .is_some()
    {
        return Err(Error::AlreadyRegistered);
    }
    if get_pending_registration_for_user(db, discord_user_id)
        .await?
        .is_some()
    {
        return Err(Error::PendingExists);
    }
    if player_store::get_player_by_username(db, &username)
        .await?
        .is_some()
    {
        return Err(Error::NameTaken { username });
    }

    let model = registration::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        discord_user_id: Set(discord_user_id.to_string()),
        claimed_username: Set(username),
        approved: Set(None),
        moderator_id: Set(None),
        created_at: Set(chrono::Utc::now()),
        decided_at: Set(None),
    };

    // The partial unique index catches a second pending row inserted concurrently
    let created = model.insert(db).await.map_err(|e| {
        if unique_violation(&e).is_some() {
            Error::PendingExists
        } else {
            e.into()
        }
    })?;

    info!(registration_id = %created.id, "Registration submitted");
    Ok(created)
}

/// Marks a pending registration as decided. Returns `false` if it was not pending.
async fn record_decision<C>(
    db: &C,
    registration_id: &str,
    approved: bool,
    moderator_id: &str,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Registration::update_many()
        .col_expr(registration::Column::Approved, Expr::value(approved))
        .col_expr(registration::Column::ModeratorId, Expr::value(moderator_id))
        .col_expr(
            registration::Column::DecidedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(registration::Column::Id.eq(registration_id))
        .filter(registration::Column::Approved.is_null())
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

async fn require_pending<C>(db: &C, registration_id: &str) -> Result<registration::Model>
where
    C: ConnectionTrait,
{
    let registration = get_registration(db, registration_id)
        .await?
        .ok_or_else(|| Error::RegistrationNotFound {
            registration_id: registration_id.to_string(),
        })?;
    if !registration.is_pending() {
        return Err(Error::AlreadyDecided {
            registration_id: registration_id.to_string(),
        });
    }
    Ok(registration)
}

/// Approves a pending registration and creates its player.
///
/// The player's snapshot is fetched from the KoG website first. The decision and the
/// new player are then written in one transaction, so nobody can observe an approved
/// registration without its player, and a failed approval leaves the registration
/// pending.
///
/// # Errors
/// - [`Error::RegistrationNotFound`] / [`Error::AlreadyDecided`]
/// - [`Error::NameTaken`] if another player claimed the name meanwhile
/// - [`Error::ExternalDataUnavailable`] if the website cannot confirm the player
#[instrument(skip(db, provider))]
pub async fn approve_registration(
    db: &DatabaseConnection,
    provider: &dyn KogProvider,
    moderator_id: &str,
    registration_id: &str,
) -> Result<ApprovedRegistration> {
    let pending = require_pending(db, registration_id).await?;
    let username = pending.claimed_username.clone();

    if player_store::get_player_by_username(db, &username)
        .await?
        .is_some()
    {
        return Err(Error::NameTaken { username });
    }

    let snapshot = provider.fetch_player(&username).await.map_err(|e| {
        warn!(username = %username, error = %e, "Approval blocked by provider failure");
        Error::ExternalDataUnavailable {
            username: username.clone(),
            reason: e.to_string(),
        }
    })?;

    let txn = db.begin().await?;

    if !record_decision(&txn, registration_id, true, moderator_id).await? {
        // Decided or withdrawn while the snapshot was being fetched
        require_pending(&txn, registration_id).await?;
        return Err(Error::AlreadyDecided {
            registration_id: registration_id.to_string(),
        });
    }
    let player = player_store::insert_player_with_snapshot(
        &txn,
        &pending.discord_user_id,
        &username,
        &snapshot,
    )
    .await?;
    let registration = get_registration(&txn, registration_id)
        .await?
        .ok_or_else(|| Error::RegistrationNotFound {
            registration_id: registration_id.to_string(),
        })?;

    txn.commit().await?;

    info!(
        discord_user_id = %player.discord_user_id,
        username = %player.username,
        "Registration approved"
    );
    Ok(ApprovedRegistration {
        registration,
        player,
    })
}

/// Rejects a pending registration. The record is kept for audit.
///
/// # Errors
/// [`Error::RegistrationNotFound`] or [`Error::AlreadyDecided`].
#[instrument(skip(db))]
pub async fn reject_registration(
    db: &DatabaseConnection,
    moderator_id: &str,
    registration_id: &str,
) -> Result<registration::Model> {
    if !record_decision(db, registration_id, false, moderator_id).await? {
        // Nothing updated: report why
        require_pending(db, registration_id).await?;
        return Err(Error::AlreadyDecided {
            registration_id: registration_id.to_string(),
        });
    }

    let registration = get_registration(db, registration_id)
        .await?
        .ok_or_else(|| Error::RegistrationNotFound {
            registration_id: registration_id.to_string(),
        })?;
    info!(discord_user_id = %registration.discord_user_id, "Registration rejected");
    Ok(registration)
}

/// Deletes the requester's own pending registration so they can register again.
///
/// # Errors
/// - [`Error::RegistrationNotFound`] if no registration has this id *and* belongs to
///   the requester
/// - [`Error::AlreadyDecided`] if the registration was already approved or rejected
#[instrument(skip(db))]
pub async fn delete_registration(
    db: &DatabaseConnection,
    requester_id: &str,
    registration_id: &str,
) -> Result<()> {
    let result = Registration::delete_many()
        .filter(registration::Column::Id.eq(registration_id))
        .filter(registration::Column::DiscordUserId.eq(requester_id))
        .filter(registration::Column::Approved.is_null())
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let owned = Registration::find()
            .filter(registration::Column::Id.eq(registration_id))
            .filter(registration::Column::DiscordUserId.eq(requester_id))
            .one(db)
            .await?;
        return Err(match owned {
            Some(_) => Error::AlreadyDecided {
                registration_id: registration_id.to_string(),
            },
            None => Error::RegistrationNotFound {
                registration_id: registration_id.to_string(),
            },
        });
    }

    info!("Registration deleted by requester");
    Ok(())
}

/// Removes the player owned by a Discord user.
///
/// Revoking the Discord role is left to the caller.
///
/// # Errors
/// [`Error::NotRegistered`] if the user owns no player.
#[instrument(skip(db))]
pub async fn unregister(db: &DatabaseConnection, discord_user_id: &str) -> Result<player::Model> {
    let player = player_store::delete_player_by_discord_id(db, discord_user_id).await?;
    info!(username = %player.username, "User unregistered");
    Ok(player)
}
