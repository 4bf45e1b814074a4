//! Registration entity - A member's claim to a KoG username, awaiting moderation.
//!
//! `approved` is `None` while the claim is pending. Once a moderator decides, it is set
//! exactly once together with `moderator_id` and `decided_at`. A partial unique index
//! guarantees at most one pending registration per Discord user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registration database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registrations")]
pub struct Model {
    /// Generated opaque identifier (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Discord user ID of the requester
    pub discord_user_id: String,
    /// KoG username the requester claims to own
    pub claimed_username: String,
    /// `None` while pending, `Some(true)` approved, `Some(false)` rejected
    pub approved: Option<bool>,
    /// Discord user ID of the deciding moderator
    pub moderator_id: Option<String>,
    /// When the registration was submitted
    pub created_at: DateTimeUtc,
    /// When the decision was recorded
    pub decided_at: Option<DateTimeUtc>,
}

/// Outcome of a moderated registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Promoted to a player by `moderator_id`
    Approved {
        /// Deciding moderator
        moderator_id: String,
    },
    /// Turned down by `moderator_id`
    Rejected {
        /// Deciding moderator
        moderator_id: String,
    },
}

impl Model {
    /// Returns the recorded decision, or `None` while pending.
    #[must_use]
    pub fn decision(&self) -> Option<Decision> {
        let moderator_id = self.moderator_id.clone().unwrap_or_default();
        self.approved.map(|approved| {
            if approved {
                Decision::Approved { moderator_id }
            } else {
                Decision::Rejected { moderator_id }
            }
        })
    }

    /// Whether the registration still awaits a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.approved.is_none()
    }
}

/// `Registration` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
