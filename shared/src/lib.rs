//! Shared types for the pmpos card engine
//!
//! Wire/domain models exchanged between terminals and the commit backend:
//! cards, actions, commits, and the unified error codes.

pub mod action;
pub mod card;
pub mod commit;
pub mod error;

// Re-exports
pub use action::Action;
pub use card::{CLOSED_STATUS, Card, CardError, CardTag, NAME_TAG, STATUS_TAG};
pub use commit::{CardData, Commit, CommitRequest};
pub use rust_decimal::Decimal;
pub use serde_json::Value;
