//! Activity model and router for the herald bot service.
//!
//! This crate provides:
//!
//! - **Activity**: one inbound conversational event
//! - **Matcher**: exact command, regex, and async predicate matching
//! - **ActivityRouter**: an ordered dispatch table of (matcher, handler)
//!   bindings, evaluated without short-circuiting
//! - **ReplyChannel**: the outbound boundary, with an in-memory recording
//!   implementation for tests
//! - **TurnContext**: what a handler sees while processing one activity

pub mod activity;
pub mod context;
pub mod error;
pub mod matcher;
pub mod reply;
pub mod router;

pub use activity::{Activity, ChannelAccount, activity_types};
pub use context::TurnContext;
pub use error::{HandlerError, MatcherError, ReplyError};
pub use matcher::{ActivityPredicate, Matcher};
pub use reply::{MemoryReplyChannel, OutgoingMessage, ReplyChannel};
pub use router::{ActivityHandler, ActivityRouter, Binding, DispatchReport, RouterBuilder};
