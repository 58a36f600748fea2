//! Neighborhood materialization.
//!
//! Turns a store plus a root id into a `State`:
//!
//! ```text
//! root ── own edges ──► center (children / parents / links)
//!      └─ every neighbor ──► neighborhood (fresh lookup each)
//!      └─ children of each parent ──► siblings
//!      └─ tiers [links, siblings, children, parents] ──► cross-link pass
//! ```
//!
//! Nothing here is incremental: every call reads the store from scratch.

use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::model::*;
use crate::storage::Store;
use crate::{Error, Result};

// ============================================================================
// Tiers
// ============================================================================

/// Neighbor category used by the cross-link pass.
///
/// Tiers are processed in `Tier::ORDER`. A node in a lateral tier drops any
/// link partner that belongs to a tier processed before its own, so a link
/// between two side-by-side nodes is recorded on one end only. The parents
/// tier sits on its own row and keeps all of its links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Links,
    Siblings,
    Children,
    Parents,
}

impl Tier {
    /// Processing order. Changing it changes which end keeps a cross link.
    pub const ORDER: [Tier; 4] = [Tier::Links, Tier::Siblings, Tier::Children, Tier::Parents];

    pub fn is_lateral(self) -> bool {
        !matches!(self, Tier::Parents)
    }
}

/// The root's classified neighbors, before the cross-link pass.
#[derive(Debug, Clone, Default)]
struct Neighbors {
    links: NeighborList,
    siblings: NeighborList,
    children: NeighborList,
    parents: NeighborList,
}

impl Neighbors {
    fn tier(&self, tier: Tier) -> &[ThoughtId] {
        match tier {
            Tier::Links => &self.links,
            Tier::Siblings => &self.siblings,
            Tier::Children => &self.children,
            Tier::Parents => &self.parents,
        }
    }

    /// Ids of every tier strictly before `index` in `Tier::ORDER`.
    fn before(&self, index: usize) -> HashSet<ThoughtId> {
        Tier::ORDER[..index]
            .iter()
            .flat_map(|&t| self.tier(t).iter().copied())
            .collect()
    }
}

// ============================================================================
// Lookups
// ============================================================================

fn child_ids<S: Store + ?Sized>(store: &S, id: ThoughtId) -> Result<NeighborList> {
    Ok(store
        .get_connections(ConnectionFilter::From(id, ConnectionType::Child))?
        .iter()
        .map(|c| c.to)
        .collect())
}

fn parent_ids<S: Store + ?Sized>(store: &S, id: ThoughtId) -> Result<NeighborList> {
    Ok(store
        .get_connections(ConnectionFilter::To(id, ConnectionType::Child))?
        .iter()
        .map(|c| c.from)
        .collect())
}

fn link_ids<S: Store + ?Sized>(store: &S, id: ThoughtId) -> Result<NeighborList> {
    Ok(store
        .get_connections(ConnectionFilter::Links(id))?
        .iter()
        .filter_map(|c| c.other_end(id))
        .collect())
}

/// Load a node with its existence flags set and its lists empty.
fn load_view_node<S: Store + ?Sized>(store: &S, id: ThoughtId) -> Result<Option<ViewNode>> {
    let Some(record) = store.get_thought(id)? else {
        return Ok(None);
    };
    let mut node = ViewNode::new(record);
    node.has_parents = !store.get_connections(ConnectionFilter::To(id, ConnectionType::Child))?.is_empty();
    node.has_children = !store.get_connections(ConnectionFilter::From(id, ConnectionType::Child))?.is_empty();
    node.has_links = !store.get_connections(ConnectionFilter::Links(id))?.is_empty();
    Ok(Some(node))
}

/// Insert `id` into the neighborhood unless it is already there.
fn insert_neighbor<S: Store + ?Sized>(
    store: &S,
    neighborhood: &mut HashMap<ThoughtId, ViewNode>,
    id: ThoughtId,
) -> Result<()> {
    if neighborhood.contains_key(&id) {
        return Ok(());
    }
    match load_view_node(store, id)? {
        Some(node) => {
            neighborhood.insert(id, node);
        }
        None => warn!(%id, "connection points at a missing thought; skipped"),
    }
    Ok(())
}

// ============================================================================
// Materialization
// ============================================================================

/// Build the `State` around `root_id`.
///
/// Fails with `NotFound` if the root does not exist. Store errors are
/// returned as-is; nothing is cached between calls.
pub fn materialize<S: Store + ?Sized>(store: &S, root_id: ThoughtId) -> Result<State> {
    let root = store
        .get_thought(root_id)?
        .ok_or_else(|| Error::NotFound(format!("Thought {root_id}")))?;

    let mut tiers = Neighbors {
        children: child_ids(store, root_id)?,
        parents: parent_ids(store, root_id)?,
        links: link_ids(store, root_id)?,
        siblings: NeighborList::new(),
    };

    let mut center = ViewNode::new(root);
    center.has_children = !tiers.children.is_empty();
    center.has_parents = !tiers.parents.is_empty();
    center.has_links = !tiers.links.is_empty();
    center.children = tiers.children.clone();
    center.parents = tiers.parents.clone();
    center.links = tiers.links.clone();

    // First insertion wins.
    let mut neighborhood = HashMap::new();
    for &id in tiers.children.iter().chain(&tiers.parents).chain(&tiers.links) {
        insert_neighbor(store, &mut neighborhood, id)?;
    }

    tiers.siblings = collect_siblings(store, root_id, &tiers, &mut neighborhood)?;
    cross_link(store, &tiers, &mut neighborhood)?;

    debug!(
        root = %root_id,
        parents = tiers.parents.len(),
        children = tiers.children.len(),
        links = tiers.links.len(),
        siblings = tiers.siblings.len(),
        visible = neighborhood.len() + 1,
        "materialized view"
    );

    Ok(State { root_id, center, neighborhood })
}

/// Children of the root's parents that are not the root itself and not
/// already a parent or link of the root. Each sibling is listed once.
fn collect_siblings<S: Store + ?Sized>(
    store: &S,
    root_id: ThoughtId,
    tiers: &Neighbors,
    neighborhood: &mut HashMap<ThoughtId, ViewNode>,
) -> Result<NeighborList> {
    let mut siblings = NeighborList::new();
    for &parent in &tiers.parents {
        for child in child_ids(store, parent)? {
            if child == root_id
                || tiers.links.contains(&child)
                || tiers.parents.contains(&child)
                || siblings.contains(&child)
            {
                continue;
            }
            siblings.push(child);
            insert_neighbor(store, neighborhood, child)?;
        }
    }
    Ok(siblings)
}

/// Fill `children` and `links` of every neighborhood node, tier by tier.
///
/// Children are never filtered. `parents` stays empty outside the center.
fn cross_link<S: Store + ?Sized>(
    store: &S,
    tiers: &Neighbors,
    neighborhood: &mut HashMap<ThoughtId, ViewNode>,
) -> Result<()> {
    for (index, &tier) in Tier::ORDER.iter().enumerate() {
        let earlier = if tier.is_lateral() { tiers.before(index) } else { HashSet::new() };

        for &id in tiers.tier(tier) {
            if !neighborhood.contains_key(&id) {
                continue;
            }
            let children = child_ids(store, id)?;
            let links: NeighborList = link_ids(store, id)?
                .into_iter()
                .filter(|partner| !earlier.contains(partner))
                .collect();

            if let Some(node) = neighborhood.get_mut(&id) {
                node.children = children;
                node.links = links;
            }
        }
    }
    Ok(())
}
