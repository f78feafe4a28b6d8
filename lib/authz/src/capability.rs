//! Capability names and per-dispatch capability snapshots.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A named precondition gating whether a binding's handler may run.
///
/// Capabilities are plain names; what satisfies one is decided by the
/// external authorization collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    /// Creates a capability from a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The capability satisfied by an authenticated agent session.
    #[must_use]
    pub fn agent_session() -> Self {
        Self::new("agent-session")
    }

    /// Returns the capability name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of capabilities satisfied at the start of one dispatch.
///
/// Taken once per inbound activity and treated as read-only for the rest of
/// the dispatch, so every binding sees the same view.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySnapshot {
    satisfied: HashSet<Capability>,
}

impl CapabilitySnapshot {
    /// A snapshot in which no capability is satisfied.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a snapshot from the satisfied capabilities.
    #[must_use]
    pub fn from_satisfied(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            satisfied: capabilities.into_iter().collect(),
        }
    }

    /// Returns true if the capability is satisfied.
    #[must_use]
    pub fn is_satisfied(&self, capability: &Capability) -> bool {
        self.satisfied.contains(capability)
    }

    /// Returns true if every listed capability is satisfied. An empty list
    /// is trivially satisfied.
    #[must_use]
    pub fn all_satisfied(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().all(|c| self.is_satisfied(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_satisfies_nothing_but_empty_list() {
        let snapshot = CapabilitySnapshot::empty();
        assert!(!snapshot.is_satisfied(&Capability::agent_session()));
        assert!(snapshot.all_satisfied(&[]));
    }

    #[test]
    fn snapshot_checks_all_listed_capabilities() {
        let snapshot = CapabilitySnapshot::from_satisfied([
            Capability::new("agent-session"),
            Capability::new("graph-read"),
        ]);

        assert!(snapshot.all_satisfied(&[Capability::agent_session()]));
        assert!(snapshot.all_satisfied(&[
            Capability::new("agent-session"),
            Capability::new("graph-read"),
        ]));
        assert!(!snapshot.all_satisfied(&[
            Capability::new("agent-session"),
            Capability::new("graph-write"),
        ]));
    }

    #[test]
    fn capability_serde_is_transparent() {
        let capability = Capability::agent_session();
        let json = serde_json::to_string(&capability).expect("serialize");
        assert_eq!(json, "\"agent-session\"");
    }
}
