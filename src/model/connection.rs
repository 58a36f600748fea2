//! Connection (edge) between two thoughts.

use serde::{Deserialize, Serialize};
use super::ThoughtId;

/// Kind of connection.
///
/// `Child` is directed (`from` is the parent). `Link` is symmetric; its
/// stored direction carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    Child,
    Link,
}

impl ConnectionType {
    /// Stable integer code used by persistent stores.
    pub fn code(self) -> i64 {
        match self {
            ConnectionType::Child => 0,
            ConnectionType::Link => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ConnectionType::Child),
            1 => Some(ConnectionType::Link),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionType::Child => f.write_str("child"),
            ConnectionType::Link => f.write_str("link"),
        }
    }
}

/// A persisted connection.
///
/// Between two distinct thoughts at most one connection exists, of either
/// type, in either stored direction. `from == to` is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub from: ThoughtId,
    pub to: ThoughtId,
    pub kind: ConnectionType,
}

impl ConnectionRecord {
    pub fn new(from: ThoughtId, to: ThoughtId, kind: ConnectionType) -> Self {
        Self { from, to, kind }
    }

    /// The "other" end of the connection from the given thought.
    pub fn other_end(&self, id: ThoughtId) -> Option<ThoughtId> {
        if id == self.from { Some(self.to) }
        else if id == self.to { Some(self.from) }
        else { None }
    }

    pub fn touches(&self, id: ThoughtId) -> bool {
        self.from == id || self.to == id
    }

    /// True if this connection joins the unordered pair `{a, b}`.
    pub fn joins(&self, a: ThoughtId, b: ThoughtId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// Predicate for `Store::get_connections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFilter {
    /// `from == id && kind == type`
    From(ThoughtId, ConnectionType),
    /// `to == id && kind == type`
    To(ThoughtId, ConnectionType),
    /// `(from == id || to == id) && kind == Link`
    Links(ThoughtId),
    /// Any type, either endpoint.
    Touching(ThoughtId),
}

impl ConnectionFilter {
    pub fn matches(&self, conn: &ConnectionRecord) -> bool {
        match *self {
            ConnectionFilter::From(id, kind) => conn.from == id && conn.kind == kind,
            ConnectionFilter::To(id, kind) => conn.to == id && conn.kind == kind,
            ConnectionFilter::Links(id) => conn.touches(id) && conn.kind == ConnectionType::Link,
            ConnectionFilter::Touching(id) => conn.touches(id),
        }
    }
}
