//! The activity router.
//!
//! An ordered dispatch table of (matcher, handler) bindings. Dispatch
//! evaluates every binding in registration order and runs every matching
//! handler to completion before evaluating the next binding. There is no
//! short-circuiting: one message may legitimately fire a specific command
//! binding and a generic catch-all binding, and handlers must never run
//! concurrently against the same conversation record.

use crate::context::TurnContext;
use crate::error::HandlerError;
use crate::matcher::{Matcher, command_arguments};
use async_trait::async_trait;
use herald_authz::{Capability, CapabilitySnapshot};
use herald_core::BindingId;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply sent when a handler fails; the specific cause goes to the log,
/// not the user.
const GENERIC_HANDLER_ERROR_REPLY: &str =
    "Sorry, something went wrong while handling that message.";

/// Trait implemented by activity handlers.
#[async_trait]
pub trait ActivityHandler: Send + Sync {
    /// Handles one activity. Errors are caught at the dispatch boundary,
    /// logged with the binding identity, and converted into a generic
    /// user-visible reply; they never stop dispatch of later bindings.
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError>;
}

/// One row of the dispatch table.
pub struct Binding {
    id: BindingId,
    name: String,
    matcher: Matcher,
    handler: Arc<dyn ActivityHandler>,
    required_capabilities: Vec<Capability>,
}

impl Binding {
    /// The binding's generated identity, used in logs.
    #[must_use]
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// The binding's registration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capabilities that must be satisfied before the matcher is even
    /// evaluated.
    #[must_use]
    pub fn required_capabilities(&self) -> &[Capability] {
        &self.required_capabilities
    }
}

/// Builds the binding table once during initialization.
///
/// The resulting [`ActivityRouter`] is read-only; there is no process-wide
/// mutable registration.
#[derive(Default)]
pub struct RouterBuilder {
    bindings: Vec<Binding>,
}

impl RouterBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding. Registration order is dispatch order.
    #[must_use]
    pub fn bind(
        self,
        name: impl Into<String>,
        matcher: Matcher,
        handler: impl ActivityHandler + 'static,
    ) -> Self {
        self.bind_gated(name, matcher, handler, Vec::new())
    }

    /// Registers a binding that is skipped entirely unless all required
    /// capabilities are satisfied.
    #[must_use]
    pub fn bind_gated(
        mut self,
        name: impl Into<String>,
        matcher: Matcher,
        handler: impl ActivityHandler + 'static,
        required_capabilities: Vec<Capability>,
    ) -> Self {
        self.bindings.push(Binding {
            id: BindingId::new(),
            name: name.into(),
            matcher,
            handler: Arc::new(handler),
            required_capabilities,
        });
        self
    }

    /// Finalizes the table.
    #[must_use]
    pub fn build(self) -> ActivityRouter {
        ActivityRouter {
            bindings: self.bindings,
        }
    }
}

/// What happened to each binding during one dispatch. Used for logging and
/// tests; ordering within each list is registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Bindings whose matcher matched and whose handler ran to completion.
    pub matched: Vec<String>,
    /// Bindings skipped because a required capability was unsatisfied.
    pub skipped_gated: Vec<String>,
    /// Bindings whose handler returned an error.
    pub failed: Vec<String>,
}

impl DispatchReport {
    /// Returns true if no binding matched the activity.
    #[must_use]
    pub fn nothing_matched(&self) -> bool {
        self.matched.is_empty() && self.failed.is_empty()
    }
}

/// The ordered, read-only dispatch table.
pub struct ActivityRouter {
    bindings: Vec<Binding>,
}

impl ActivityRouter {
    /// Returns the number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if no binding is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns the union of capabilities required by any binding, in first
    /// occurrence order. The surrounding service resolves these into one
    /// snapshot per dispatch.
    #[must_use]
    pub fn required_capabilities(&self) -> Vec<Capability> {
        let mut capabilities: Vec<Capability> = Vec::new();
        for binding in &self.bindings {
            for capability in &binding.required_capabilities {
                if !capabilities.contains(capability) {
                    capabilities.push(capability.clone());
                }
            }
        }
        capabilities
    }

    /// Dispatches one activity.
    ///
    /// Every binding is considered in registration order. For each one:
    /// gating is checked against the snapshot first (matcher not evaluated
    /// when gated out), then the matcher runs (an evaluation error is a
    /// logged non-match), then the handler runs to completion. A handler
    /// error is logged with the binding identity, answered with a generic
    /// reply, and dispatch continues.
    pub async fn dispatch(
        &self,
        ctx: &mut TurnContext<'_>,
        capabilities: &CapabilitySnapshot,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for binding in &self.bindings {
            if !capabilities.all_satisfied(&binding.required_capabilities) {
                debug!(binding = %binding.name, "binding skipped: capability unsatisfied");
                report.skipped_gated.push(binding.name.clone());
                continue;
            }

            let matched = match binding.matcher.evaluate(ctx.activity()).await {
                Ok(matched) => matched,
                Err(e) => {
                    warn!(
                        binding = %binding.name,
                        binding_id = %binding.id,
                        error = %e,
                        "matcher evaluation failed; treating as non-match"
                    );
                    false
                }
            };
            if !matched {
                continue;
            }

            ctx.set_args(extract_args(ctx, &binding.matcher));

            match binding.handler.handle(ctx).await {
                Ok(()) => {
                    debug!(binding = %binding.name, "handler completed");
                    report.matched.push(binding.name.clone());
                }
                Err(e) => {
                    warn!(
                        binding = %binding.name,
                        binding_id = %binding.id,
                        error = %e,
                        "handler failed"
                    );
                    report.failed.push(binding.name.clone());
                    if let Err(send_err) = ctx.send_text(GENERIC_HANDLER_ERROR_REPLY).await {
                        warn!(
                            binding = %binding.name,
                            error = %send_err,
                            "failed to deliver handler error reply"
                        );
                    }
                }
            }

            ctx.set_args(None);
        }

        report
    }
}

fn extract_args(ctx: &TurnContext<'_>, matcher: &Matcher) -> Option<String> {
    match matcher {
        Matcher::Command(command) => ctx
            .activity()
            .text
            .as_deref()
            .and_then(|text| command_arguments(text, command))
            .map(str::to_string),
        _ => None,
    }
}
