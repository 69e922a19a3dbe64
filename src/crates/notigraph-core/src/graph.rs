//! Connected-component descriptors.
//!
//! A [`Graph`] describes one weakly-connected component of the notification
//! net: its member items, the behaviors live in it, the interest index that
//! routes cross-behavior attribute writes, and the tree/head metadata that
//! enables fast-path traversal.
//!
//! Graphs are short-lived. One is created when the first edge joins two
//! single items, grows as items subscribe in, and dies when an edge joins
//! it to another graph: the losing component's items are retargeted to the
//! winner and the loser becomes a tombstone. Observing a tombstone fails
//! with [`GraphDestroyed`](crate::NotificationError::GraphDestroyed); a
//! stale [`GraphId`] is a bug in the caller, not a stale-but-usable view.
//!
//! # Examples
//!
//! ```rust
//! use notigraph_core::NotificationNet;
//!
//! let mut net = NotificationNet::new();
//! let (a, b, c) = (net.add_item(), net.add_item(), net.add_item());
//!
//! net.subscribe(a, b)?;
//! net.subscribe(b, c)?;
//!
//! let graph = net.graph_of(a).expect("a is connected");
//! assert_eq!(graph.len()?, 3);
//! assert!(graph.is_tree()?);
//! assert_eq!(graph.head()?, Some(a));
//! # Ok::<(), notigraph_core::NotificationError>(())
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::behavior::{same_behavior, BehaviorRegistry, NotificationBehavior};
use crate::error::{NotificationError, Result};
use crate::item::{Identifier, ItemId, ItemState};

/// Handle to a connected component. Stable for the component's lifetime,
/// dangling after the component loses a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphId(u64);

impl GraphId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph#{}", self.0)
    }
}

/// One weakly-connected component: member items, live behaviors, interest
/// index, and tree/head metadata.
pub struct Graph {
    id: GraphId,
    items: BTreeSet<ItemId>,
    registry: BehaviorRegistry,
    /// (type identifier, attribute name) → behaviors that want to observe
    /// writes to that attribute
    interests: HashMap<(Identifier, String), Vec<Rc<dyn NotificationBehavior>>>,
    is_tree: bool,
    /// the unique zero-subscriber item, when there is exactly one
    head: Option<ItemId>,
    /// number of zero-subscriber items
    head_count: usize,
    destroyed: bool,
}

impl Graph {
    pub(crate) fn new(id: GraphId) -> Self {
        Self {
            id,
            items: BTreeSet::new(),
            registry: BehaviorRegistry::new(),
            interests: HashMap::new(),
            is_tree: false,
            head: None,
            head_count: 0,
            destroyed: false,
        }
    }

    /// The component's id. Readable even after destruction so errors can
    /// name the graph they refer to.
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Whether this component lost a merge and is now a tombstone.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn ensure_live(&self) -> Result<()> {
        if self.destroyed {
            Err(NotificationError::GraphDestroyed(self.id))
        } else {
            Ok(())
        }
    }

    /// Whether the component's underlying edges form a tree rooted at
    /// [`head`](Self::head).
    pub fn is_tree(&self) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.is_tree)
    }

    /// The unique item with zero subscribers, or `None` when the component
    /// has several.
    pub fn head(&self) -> Result<Option<ItemId>> {
        self.ensure_live()?;
        Ok(self.head)
    }

    /// Number of member items.
    pub fn len(&self) -> Result<usize> {
        self.ensure_live()?;
        Ok(self.items.len())
    }

    /// Whether the component has no members.
    pub fn is_empty(&self) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.items.is_empty())
    }

    /// Whether `item` is a member.
    pub fn contains(&self, item: ItemId) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.items.contains(&item))
    }

    /// Iterate member items in id order.
    pub fn items(&self) -> Result<impl Iterator<Item = ItemId> + '_> {
        self.ensure_live()?;
        Ok(self.items.iter().copied())
    }

    pub(crate) fn head_count(&self) -> usize {
        self.head_count
    }

    pub(crate) fn is_tree_raw(&self) -> bool {
        self.is_tree
    }

    pub(crate) fn head_raw(&self) -> Option<ItemId> {
        self.head
    }

    pub(crate) fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    pub(crate) fn member_ids(&self) -> &BTreeSet<ItemId> {
        &self.items
    }

    /// Bind one (behavior, identifier) pair added to a member item after
    /// it joined.
    pub(crate) fn bind_behavior(
        &mut self,
        behavior: &Rc<dyn NotificationBehavior>,
        identifier: &str,
    ) {
        self.registry.insert(behavior, identifier);
        self.register_interest(identifier, behavior);
    }

    pub(crate) fn set_metadata(&mut self, is_tree: bool, head: Option<ItemId>, head_count: usize) {
        self.is_tree = is_tree;
        self.head = head;
        self.head_count = head_count;
    }

    pub(crate) fn install_registry(&mut self, registry: BehaviorRegistry) {
        self.registry = registry;
    }

    /// Add one item and fold its behaviors into the interest index.
    pub(crate) fn register_item(&mut self, item: &ItemState) {
        self.items.insert(item.id);
        for (identifier, behavior) in &item.behaviors {
            self.register_interest(identifier, behavior);
        }
    }

    /// Record `behavior`'s interested attributes under `identifier`.
    pub(crate) fn register_interest(
        &mut self,
        identifier: &str,
        behavior: &Rc<dyn NotificationBehavior>,
    ) {
        for attribute in behavior.interested_attributes() {
            let key = (identifier.to_string(), attribute);
            let entry = self.interests.entry(key).or_default();
            if !entry.iter().any(|b| same_behavior(b, behavior)) {
                entry.push(Rc::clone(behavior));
            }
        }
    }

    /// Behaviors that declared interest in (`identifier`, `attribute`).
    pub(crate) fn interested(
        &self,
        identifier: &str,
        attribute: &str,
    ) -> &[Rc<dyn NotificationBehavior>] {
        self.interests
            .get(&(identifier.to_string(), attribute.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Take everything out of a losing component and leave it a tombstone.
    /// The caller retargets member back-references before this runs.
    pub(crate) fn absorb(&mut self, loser: &mut Graph) {
        debug_assert!(!loser.destroyed, "absorbing an already destroyed graph");
        self.items.append(&mut loser.items);
        self.registry.merge(&loser.registry);
        for ((identifier, attribute), behaviors) in loser.interests.drain() {
            let entry = self
                .interests
                .entry((identifier, attribute))
                .or_default();
            for behavior in behaviors {
                if !entry.iter().any(|b| same_behavior(b, &behavior)) {
                    entry.push(behavior);
                }
            }
        }
        loser.destroyed = true;
        loser.head = None;
        loser.head_count = 0;
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("is_tree", &self.is_tree)
            .field("head", &self.head)
            .field("head_count", &self.head_count)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destroyed_graph_rejects_reads() {
        let mut winner = Graph::new(GraphId::new(0));
        let mut loser = Graph::new(GraphId::new(1));
        loser.items.insert(ItemId::new(7));

        winner.absorb(&mut loser);

        assert!(loser.is_destroyed());
        assert!(matches!(
            loser.len(),
            Err(NotificationError::GraphDestroyed(id)) if id == GraphId::new(1)
        ));
        assert_eq!(winner.len().unwrap(), 1);
    }
}
