//! Per-conversation state for the herald bot service.
//!
//! This crate provides:
//!
//! - **ConversationRecord**: the small mutable record kept per conversation
//! - **ConversationStateStore**: the storage boundary, with an in-memory
//!   implementation
//! - **ConversationLocks**: per-conversation mutual exclusion, so activities
//!   for the same conversation are never processed concurrently

pub mod error;
pub mod lock;
pub mod record;
pub mod store;

pub use error::StateError;
pub use lock::ConversationLocks;
pub use record::ConversationRecord;
pub use store::{ConversationStateStore, MemoryStateStore};
