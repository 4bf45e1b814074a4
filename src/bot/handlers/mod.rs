//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete and the
//! moderation button clicks on registration messages.

/// Autocomplete handlers for player names
pub mod autocomplete;
/// Approve / reject / delete buttons on registration messages
pub mod moderation;
