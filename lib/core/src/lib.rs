//! Core domain types and utilities for the herald bot service.
//!
//! This crate provides the foundational types, error handling, and shared
//! identifiers used throughout the herald conversational bot endpoint.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{BindingId, ConversationId, RunId, ThreadId};
