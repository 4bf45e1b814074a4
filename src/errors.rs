//! Unified error types for the KoG bot.
//!
//! Business failures (registration conflicts, unknown players, undecided records) are
//! separate variants from infrastructure failures (provider, database, Discord) so the
//! bot layer can tell the user whether to fix their input, try again later, or ask a
//! moderator for help.

use crate::provider::ProviderError;
use thiserror::Error;

/// All errors produced by the bot.
#[derive(Debug, Error)]
pub enum Error {
    /// The claimed KoG username is empty or malformed.
    #[error("Invalid KoG username: {message}")]
    InvalidUsername {
        /// What is wrong with the name
        message: String,
    },

    /// The Discord user already owns a registered player.
    #[error("This Discord account is already registered")]
    AlreadyRegistered,

    /// The Discord user already has a registration awaiting review.
    #[error("A registration for this Discord account is already pending review")]
    PendingExists,

    /// The KoG username already belongs to a registered player.
    #[error("The KoG name '{username}' is already taken")]
    NameTaken {
        /// The contested KoG username
        username: String,
    },

    /// No registration matches the given id (and owner, for deletes).
    #[error("Registration '{registration_id}' not found")]
    RegistrationNotFound {
        /// The registration id that was looked up
        registration_id: String,
    },

    /// The registration was already approved or rejected.
    #[error("Registration '{registration_id}' has already been decided")]
    AlreadyDecided {
        /// The registration id that was looked up
        registration_id: String,
    },

    /// The Discord user has no registered player.
    #[error("This Discord account is not registered")]
    NotRegistered,

    /// A queried KoG username has no registered player.
    #[error("No registered player named '{username}'")]
    PlayerNotFound {
        /// The missing KoG username
        username: String,
    },

    /// An unfinished-map query was submitted without players.
    #[error("No players selected")]
    NoPlayersSelected,

    /// An unfinished-map query named more players than allowed.
    #[error("At most {max} players can be compared at once")]
    TooManyPlayers {
        /// Upper bound on players per query
        max: usize,
    },

    /// The KoG website could not confirm a player while approving a registration.
    #[error("Could not fetch KoG data for '{username}': {reason}")]
    ExternalDataUnavailable {
        /// The KoG username being fetched
        username: String,
        /// Underlying provider failure
        reason: String,
    },

    /// Errors from the KoG website client.
    #[error("KoG provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Errors from the database layer.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration or environment problems.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Errors from serenity/poise.
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),

    /// Errors while building message text.
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Coarse classification used to pick the wording of user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The user asked for something the rules do not allow.
    Validation,
    /// The referenced record does not exist.
    NotFound,
    /// The KoG website failed or timed out.
    Provider,
    /// The database failed.
    Store,
    /// Anything else (Discord, configuration, formatting).
    Internal,
}

impl Error {
    /// Classifies the error for presentation.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUsername { .. }
            | Self::AlreadyRegistered
            | Self::PendingExists
            | Self::NameTaken { .. }
            | Self::AlreadyDecided { .. }
            | Self::NotRegistered
            | Self::NoPlayersSelected
            | Self::TooManyPlayers { .. } => ErrorCategory::Validation,
            Self::RegistrationNotFound { .. } | Self::PlayerNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Self::ExternalDataUnavailable { .. } | Self::Provider(_) => ErrorCategory::Provider,
            Self::Database(_) => ErrorCategory::Store,
            Self::Config { .. } | Self::Framework(_) | Self::Format(_) => ErrorCategory::Internal,
        }
    }

    /// Whether repeating the same action later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Provider | ErrorCategory::Store)
    }

    /// Renders a message suitable for showing to the Discord user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PendingExists => format!(
                "⏳ {self}. Wait for a moderator, or use `/kog withdraw` and register again. \
                 If it has been stuck for a long time, contact a moderator."
            ),
            Self::AlreadyRegistered => {
                format!("❌ {self}. To register a different name, contact a moderator.")
            }
            _ => match self.category() {
                ErrorCategory::Validation | ErrorCategory::NotFound => {
                    format!("❌ {self}. Please check your input.")
                }
                ErrorCategory::Provider => format!(
                    "⏳ {self}. The KoG website may be busy, try again later \
                     or delete the registration and resubmit."
                ),
                ErrorCategory::Store | ErrorCategory::Internal => {
                    format!("⚠️ Something went wrong on our side ({self}). Try again later.")
                }
            },
        }
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_ask_for_input_fix() {
        let err = Error::NameTaken {
            username: "Cheeser0613".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.user_message().contains("check your input"));
    }

    #[test]
    fn test_provider_errors_ask_to_retry() {
        let err = Error::ExternalDataUnavailable {
            username: "nobody".to_string(),
            reason: "timed out".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Provider);
        assert!(err.user_message().contains("try again later"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_decided_and_missing_records_are_final() {
        let decided = Error::AlreadyDecided {
            registration_id: "r1".to_string(),
        };
        let missing = Error::RegistrationNotFound {
            registration_id: "r1".to_string(),
        };
        assert!(!decided.is_retryable());
        assert!(!missing.is_retryable());
    }

    #[test]
    fn test_pending_registration_points_to_moderator() {
        let message = Error::PendingExists.user_message();
        assert!(message.contains("contact a moderator"));
        assert!(message.contains("/kog withdraw"));
    }

    #[test]
    fn test_store_errors_are_not_validation() {
        let err = Error::Database(sea_orm::DbErr::Custom("disk full".to_string()));
        assert_eq!(err.category(), ErrorCategory::Store);
        assert!(!err.user_message().contains("check your input"));
        assert!(err.is_retryable());
    }
}
