//! Capability gating for the herald bot service.
//!
//! Bindings in the activity router can declare required capabilities, named
//! preconditions such as "an authenticated agent session exists". Capability
//! state is owned by an external authorization collaborator reached through
//! the [`TokenProvider`] trait; this crate only snapshots a
//! boolean-per-capability view of it, once per dispatch.

mod capability;
mod error;
mod token;

pub use capability::{Capability, CapabilitySnapshot};
pub use error::TokenError;
pub use token::{AccessToken, StaticTokenProvider, TokenProvider};
