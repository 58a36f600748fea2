//! Materialized view types: the neighborhood shown around the root thought.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{ThoughtId, ThoughtRecord};

/// View-local neighbor list.
pub type NeighborList = SmallVec<[ThoughtId; 8]>;

/// A thought as it appears in a materialized `State`.
///
/// `has_*` flags come from a direct lookup of the thought's own connections
/// and are never filtered. The neighbor lists are view-local: only the center
/// node carries `parents`, and neighborhood nodes may have `links` trimmed by
/// the cross-link pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewNode {
    pub id: ThoughtId,
    pub name: String,
    pub has_parents: bool,
    pub has_children: bool,
    pub has_links: bool,
    pub parents: NeighborList,
    pub children: NeighborList,
    pub links: NeighborList,
}

impl ViewNode {
    pub fn new(record: ThoughtRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            ..Self::default()
        }
    }
}

/// The bounded neighborhood materialized around `root_id`.
///
/// A `State` owns all of its nodes. It is rebuilt from the store after every
/// `select` and every successful mutation; a superseded `State` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub root_id: ThoughtId,
    pub center: ViewNode,
    pub neighborhood: HashMap<ThoughtId, ViewNode>,
}

impl State {
    /// Look up a visible node, including the center.
    pub fn node(&self, id: ThoughtId) -> Option<&ViewNode> {
        if id == self.root_id {
            Some(&self.center)
        } else {
            self.neighborhood.get(&id)
        }
    }

    /// True if `id` is visible anywhere in this view.
    pub fn contains(&self, id: ThoughtId) -> bool {
        self.node(id).is_some()
    }

    /// Number of visible nodes, center included. Never zero.
    pub fn visible_count(&self) -> usize {
        self.neighborhood.len() + 1
    }
}
