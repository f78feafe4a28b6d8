//! herald HTTP endpoint.
//!
//! Composes the bot service from the library crates: the binding table,
//! conversation state, capability resolution, the agent job runner, and the
//! axum surface that receives channel activities.

pub mod bindings;
pub mod config;
pub mod error;
pub mod reply;
pub mod routes;
pub mod service;
