use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a party (account, wallet, solver) in the payment network.
///
/// Party identifiers are opaque: the engine never validates that a party
/// exists, it only compares identifiers for equality.
///
/// # Examples
///
/// ```
/// use intent_netting::core::party::PartyId;
///
/// let alice = PartyId::new("alice");
/// let bob = PartyId::new("bob");
/// assert_ne!(alice, bob);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this party ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PartyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PartyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Arena handle for a party interned in an
/// [`ObligationGraph`](crate::graph::obligation_graph::ObligationGraph).
///
/// Handles are assigned in first-appearance order and are only meaningful
/// for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartyIndex(usize);

impl PartyIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PartyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
