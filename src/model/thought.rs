//! Thought (node) in the notebook graph.

use serde::{Deserialize, Serialize};

/// Opaque thought identifier.
///
/// `ThoughtId::INVALID` is reserved and never names a stored thought.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThoughtId(pub u64);

impl ThoughtId {
    /// Sentinel for "no thought".
    pub const INVALID: ThoughtId = ThoughtId(u64::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl std::fmt::Display for ThoughtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("<invalid>")
        }
    }
}

impl From<u64> for ThoughtId {
    fn from(raw: u64) -> Self {
        ThoughtId(raw)
    }
}

/// A persisted thought: id plus display name.
///
/// The attached document lives in a `TextStore`, keyed by the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtRecord {
    pub id: ThoughtId,
    pub name: String,
}

impl ThoughtRecord {
    pub fn new(id: ThoughtId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    /// Case-insensitive substring match on the name.
    pub fn name_contains(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }
}
