//! Core business logic - framework-agnostic registration, query and refresh operations.
//!
//! Every function takes its collaborators explicitly: a database connection for the
//! player, map and registration stores, and a [`crate::provider::KogProvider`] where
//! website data is needed.

/// Map catalog storage and difficulty labels
pub mod map;
/// Player storage and snapshot replacement
pub mod player;
/// Unfinished-map intersection across players
pub mod query;
/// Nightly resynchronisation of players and maps
pub mod refresh;
/// Registration and moderation state machine
pub mod registration;
/// Text rendering helpers for star ratings and map lists
pub mod report;

use sea_orm::{DbErr, SqlErr};

/// Returns the violated constraint description when `err` is a unique-index failure.
pub(crate) fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}
