//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// KoG registration, query and refresh commands
pub mod kog;

// Export commands
pub use general::*;
pub use kog::*;
