//! The notification net: flat item store plus the subscription transaction.
//!
//! [`NotificationNet`] owns every item and every component descriptor.
//! Items are addressed by [`ItemId`]; their graph membership is a plain
//! [`GraphId`] back-reference into the net's graph table, so the item ↔
//! graph reference cycle of the domain never turns into an ownership
//! cycle.
//!
//! # Structural mutation
//!
//! Every edge change goes through a two-phase transaction:
//!
//! 1. **Pre-phase**: classify the operation by which endpoints already
//!    have a graph, run the cycle pre-check for same-graph edges, build
//!    the merged behavior registry, and fire each behavior's
//!    `pre_subscribe` hook. Any failure aborts with nothing mutated.
//! 2. **Edge mutation + post-phase**: insert the symmetric edge pair,
//!    then recompute the surviving graph's tree flag, head pointer and
//!    head count, and retarget items when two components merged.
//!
//! # Attribute dispatch
//!
//! [`set_attribute`](NotificationNet::set_attribute) first runs every
//! behavior that declared interest in the written name (so a counter can
//! observe activation flags on items it is not attached to), then the
//! owning behavior, which performs the write and its own propagation.
//!
//! # Examples
//!
//! ```rust
//! use notigraph_core::{NotificationNet, NotificationType, NotifySubscribers};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let red_point = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()));
//!
//! let mut net = NotificationNet::new();
//! let inbox = net.add_item();
//! let folder = net.add_item();
//! net.add_notification(inbox, &red_point)?;
//! net.add_notification(folder, &red_point)?;
//!
//! // folder aggregates inbox
//! net.subscribe(folder, inbox)?;
//! net.notification(inbox, "red_point")?.set_attribute("activate", json!(true))?;
//!
//! let badge = net.notification(folder, "red_point")?.get_attribute("activate")?;
//! assert_eq!(badge, json!(true));
//! # Ok::<(), notigraph_core::NotificationError>(())
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::attribute::{AttributeHandle, AttributeSet};
use crate::behavior::{same_behavior, AttributeRef, BehaviorRegistry, NotificationBehavior};
use crate::error::{NotificationError, Result};
use crate::graph::{Graph, GraphId};
use crate::item::{Identifier, ItemId, ItemState, NotificationType};
use crate::util::GraphCondition;
use crate::walk::{Walk, WalkOptions};

/// Flat store of items and components; the crate's entry point.
pub struct NotificationNet {
    items: HashMap<ItemId, ItemState>,
    graphs: HashMap<GraphId, Graph>,
    next_item: u64,
    next_graph: u64,
    check_circular: bool,
}

impl Default for NotificationNet {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationNet {
    /// Create an empty net with the cycle pre-check enabled.
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            graphs: HashMap::new(),
            next_item: 0,
            next_graph: 0,
            check_circular: true,
        }
    }

    /// Toggle the circular-subscription pre-check. With the check off,
    /// same-graph subscriptions skip the downstream walk; feeding the
    /// engine a cycle afterwards is the caller's problem.
    pub fn set_check_circular(&mut self, check: bool) {
        self.check_circular = check;
    }

    /// Create an isolated item.
    pub fn add_item(&mut self) -> ItemId {
        let id = ItemId::new(self.next_item);
        self.next_item += 1;
        self.items.insert(id, ItemState::new(id));
        id
    }

    /// Number of items in the net.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the net has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate all item ids.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    pub(crate) fn item(&self, id: ItemId) -> Result<&ItemState> {
        self.items.get(&id).ok_or(NotificationError::UnknownItem(id))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Result<&mut ItemState> {
        self.items
            .get_mut(&id)
            .ok_or(NotificationError::UnknownItem(id))
    }

    fn graph_lookup(&self, id: GraphId) -> Result<&Graph> {
        self.graphs
            .get(&id)
            .ok_or(NotificationError::GraphDestroyed(id))
    }

    // ------------------------------------------------------------------
    // Notification types and attributes
    // ------------------------------------------------------------------

    /// Attach a notification type to an item.
    ///
    /// Seeds the type's attribute set with its defaults (deep-copied per
    /// item) and, when the item is already part of a graph, registers the
    /// behavior and its interests there.
    pub fn add_notification(&mut self, item: ItemId, ty: &NotificationType) -> Result<()> {
        self.add_notification_with(item, ty, HashMap::new())
    }

    /// [`add_notification`](Self::add_notification) with per-item override
    /// values layered over the type's defaults.
    pub fn add_notification_with(
        &mut self,
        item: ItemId,
        ty: &NotificationType,
        overrides: HashMap<String, Value>,
    ) -> Result<()> {
        let identifier = ty.identifier().to_string();
        let behavior = Rc::clone(ty.behavior());
        let graph = {
            let state = self.item_mut(item)?;
            if state.behaviors.contains_key(&identifier) {
                return Err(NotificationError::DuplicateNotificationType {
                    item,
                    identifier,
                });
            }
            state
                .behaviors
                .insert(identifier.clone(), Rc::clone(&behavior));
            // Propagation may have created the set before the type was
            // attached; keep any inherited state it already carries.
            let set = state.attributes.entry(identifier.clone()).or_default();
            for (name, value) in ty.defaults() {
                set.set_owned(name, value.clone());
            }
            for (name, value) in overrides {
                set.set_owned(name, value);
            }
            state.graph
        };
        if let Some(gid) = graph {
            let graph = self
                .graphs
                .get_mut(&gid)
                .ok_or(NotificationError::GraphDestroyed(gid))?;
            graph.bind_behavior(&behavior, &identifier);
        }
        Ok(())
    }

    /// Handle for the attributes of `identifier` on `item`.
    ///
    /// Fails when the item does not carry the type.
    pub fn notification(&mut self, item: ItemId, identifier: &str) -> Result<AttributeHandle<'_>> {
        if !self.item(item)?.behaviors.contains_key(identifier) {
            return Err(NotificationError::MissingNotificationType {
                item,
                identifier: identifier.to_string(),
            });
        }
        Ok(AttributeHandle::new(self, item, identifier.to_string()))
    }

    fn owning_behavior(
        &self,
        item: ItemId,
        identifier: &str,
    ) -> Result<Rc<dyn NotificationBehavior>> {
        self.item(item)?
            .behaviors
            .get(identifier)
            .cloned()
            .ok_or_else(|| NotificationError::MissingNotificationType {
                item,
                identifier: identifier.to_string(),
            })
    }

    /// Gathered value of `name` under `identifier` on `item`, as the
    /// owning behavior defines it.
    pub fn get_attribute(&self, item: ItemId, identifier: &str, name: &str) -> Result<Value> {
        let behavior = self.owning_behavior(item, identifier)?;
        let at = AttributeRef::new(item, identifier);
        behavior.get_attribute(self, &at, name)
    }

    /// Write `name` under `identifier` on `item`.
    ///
    /// Behaviors that declared interest in the name run first, then the
    /// owning behavior commits the write and propagates. Interest order
    /// across behaviors is unspecified.
    pub fn set_attribute(
        &mut self,
        item: ItemId,
        identifier: &str,
        name: &str,
        value: Value,
    ) -> Result<()> {
        let behavior = self.owning_behavior(item, identifier)?;
        let interested: Vec<Rc<dyn NotificationBehavior>> = match self.item(item)?.graph {
            Some(gid) => {
                let graph = self.graph_lookup(gid)?;
                debug_assert!(!graph.is_destroyed(), "live item points at destroyed graph");
                graph
                    .interested(identifier, name)
                    .iter()
                    .filter(|b| !same_behavior(b, &behavior))
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        };
        trace!(%item, identifier, name, observers = interested.len(), "attribute write");
        let at = AttributeRef::new(item, identifier);
        for observer in &interested {
            observer.set_attribute(self, &at, name, value.clone())?;
        }
        behavior.set_attribute(self, &at, name, value)
    }

    /// Identifiers with attribute state on `item`: attached types plus
    /// sets created by propagation passing through.
    pub fn notification_identifiers(&self, item: ItemId) -> Vec<Identifier> {
        let mut identifiers: Vec<Identifier> = self
            .items
            .get(&item)
            .map(|state| state.attributes.keys().cloned().collect())
            .unwrap_or_default();
        identifiers.sort();
        identifiers
    }

    /// Attribute set for `identifier` on `item`, if one exists.
    pub fn attribute_set(&self, item: ItemId, identifier: &str) -> Option<&AttributeSet> {
        self.items.get(&item)?.attributes.get(identifier)
    }

    /// Mutable access to an existing attribute set.
    pub fn attribute_set_mut(
        &mut self,
        item: ItemId,
        identifier: &str,
    ) -> Option<&mut AttributeSet> {
        self.items.get_mut(&item)?.attributes.get_mut(identifier)
    }

    /// Attribute set for `identifier` on `item`, created empty when
    /// absent. Propagating behaviors use this to write inherited state on
    /// items that never had the type attached.
    pub fn ensure_attribute_set(
        &mut self,
        item: ItemId,
        identifier: &str,
    ) -> Result<&mut AttributeSet> {
        let state = self.item_mut(item)?;
        Ok(state
            .attributes
            .entry(identifier.to_string())
            .or_default())
    }

    // ------------------------------------------------------------------
    // Topology observers
    // ------------------------------------------------------------------

    /// Items `item` subscribes to (its propagation sources).
    pub fn notifier_items(&self, item: ItemId) -> Result<Vec<ItemId>> {
        Ok(self.item(item)?.notifiers.iter().copied().collect())
    }

    /// Items subscribing to `item` (its propagation targets).
    pub fn subscriber_items(&self, item: ItemId) -> Result<Vec<ItemId>> {
        Ok(self.item(item)?.subscribers.iter().copied().collect())
    }

    pub(crate) fn notifier_neighbors(&self, item: ItemId) -> Vec<ItemId> {
        self.items
            .get(&item)
            .map(|state| state.notifiers.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn subscriber_neighbors(&self, item: ItemId) -> Vec<ItemId> {
        self.items
            .get(&item)
            .map(|state| state.subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the item has no edges (and therefore no graph).
    pub fn is_single(&self, item: ItemId) -> Result<bool> {
        Ok(self.item(item)?.is_single())
    }

    /// Whether the item belongs to a graph and has zero subscribers.
    pub fn is_head(&self, item: ItemId) -> Result<bool> {
        let state = self.item(item)?;
        Ok(state.graph.is_some() && state.subscribers.is_empty())
    }

    /// Whether the item is the head of a graph whose edges form a tree.
    pub fn is_head_of_tree(&self, item: ItemId) -> Result<bool> {
        let state = self.item(item)?;
        match state.graph {
            Some(gid) => {
                let graph = self.graph_lookup(gid)?;
                Ok(graph.is_tree_raw() && graph.head_raw() == Some(item))
            }
            None => Ok(false),
        }
    }

    /// The component `item` belongs to, or `None` while it is single.
    pub fn graph_of(&self, item: ItemId) -> Option<&Graph> {
        let gid = self.items.get(&item)?.graph?;
        self.graphs.get(&gid)
    }

    /// Look up a component by id; includes tombstones of merged-away
    /// graphs, whose accessors all fail.
    pub fn graph(&self, id: GraphId) -> Option<&Graph> {
        self.graphs.get(&id)
    }

    /// Whether `other` notifies `item`, directly (`find_indirect = false`)
    /// or through any downstream path (`find_indirect = true`).
    pub fn has_subscription(
        &self,
        item: ItemId,
        other: ItemId,
        find_indirect: bool,
    ) -> Result<bool> {
        let state = self.item(item)?;
        if !find_indirect {
            return Ok(state.notifiers.contains(&other));
        }
        if item == other {
            return Ok(false);
        }
        Ok(self
            .walk_through(item, WalkOptions::downstream())?
            .any(|reached| reached == other))
    }

    /// Lazily iterate items reachable from `start`; see [`WalkOptions`].
    pub fn walk_through(&self, start: ItemId, options: WalkOptions) -> Result<Walk<'_>> {
        self.item(start)?;
        Ok(Walk::new(self, start, options))
    }

    // ------------------------------------------------------------------
    // Subscription transaction
    // ------------------------------------------------------------------

    /// Subscribe `subscriber` to `notifier`, so that state set on the
    /// notifier propagates to the subscriber.
    ///
    /// Returns `Ok(false)` when the edge already exists; nothing runs in
    /// that case. Structural failures (self-subscription, would-be cycle)
    /// abort before any mutation.
    pub fn subscribe(&mut self, subscriber: ItemId, notifier: ItemId) -> Result<bool> {
        if subscriber == notifier {
            return Err(NotificationError::SelfSubscription(subscriber));
        }
        let sub_graph = self.item(subscriber)?.graph;
        let notif_graph = self.item(notifier)?.graph;
        if self.item(subscriber)?.notifiers.contains(&notifier) {
            return Ok(false);
        }
        let condition = GraphCondition::classify(sub_graph, notif_graph);
        debug!(%subscriber, %notifier, ?condition, "subscribe");

        if let (Some(sg), Some(ng)) = (sub_graph, notif_graph) {
            if sg == ng && self.check_circular {
                let closes_cycle = self
                    .walk_through(notifier, WalkOptions::downstream())?
                    .any(|reached| reached == subscriber);
                if closes_cycle {
                    debug!(%subscriber, %notifier, "rejected circular subscription");
                    return Err(NotificationError::CircularSubscription {
                        subscriber,
                        notifier,
                    });
                }
            }
        }

        // Behavior registry of the graph as it will exist after the edge.
        let registry = match (sub_graph, notif_graph) {
            (None, None) => {
                let mut registry = BehaviorRegistry::from_item(&self.item(subscriber)?.behaviors);
                registry.extend_from_item(&self.item(notifier)?.behaviors);
                registry
            }
            (None, Some(ng)) => {
                let mut registry = self.graph_lookup(ng)?.registry().clone();
                registry.extend_from_item(&self.item(subscriber)?.behaviors);
                registry
            }
            (Some(sg), None) => {
                let mut registry = self.graph_lookup(sg)?.registry().clone();
                registry.extend_from_item(&self.item(notifier)?.behaviors);
                registry
            }
            (Some(sg), Some(ng)) if sg == ng => self.graph_lookup(sg)?.registry().clone(),
            (Some(sg), Some(ng)) => {
                let mut registry = self.graph_lookup(sg)?.registry().clone();
                registry.merge(self.graph_lookup(ng)?.registry());
                registry
            }
        };

        for (behavior, related) in registry.iter() {
            behavior.pre_subscribe(self, subscriber, notifier, related)?;
        }

        // Facts the post-phase needs, captured before the edge lands.
        let notifier_had_subscribers = !self.item(notifier)?.subscribers.is_empty();
        let (sub_tree, sub_head, sub_count) = self.side_metadata(subscriber, sub_graph)?;
        let (notif_tree, notif_head, notif_count) = self.side_metadata(notifier, notif_graph)?;

        self.item_mut(subscriber)?.notifiers.insert(notifier);
        self.item_mut(notifier)?.subscribers.insert(subscriber);

        let same_graph = matches!((sub_graph, notif_graph), (Some(a), Some(b)) if a == b);
        let is_tree_after = sub_tree && notif_tree && notif_head == Some(notifier);

        let (new_head, new_count) = if same_graph {
            let mut count = sub_count;
            let mut head = sub_head;
            if !notifier_had_subscribers {
                debug_assert!(count > 1, "head gained a subscriber inside its own graph");
                count = count.saturating_sub(1);
                head = if count == 1 {
                    self.find_head_upward(subscriber)
                } else {
                    None
                };
            }
            (head, count)
        } else {
            let mut count = sub_count + notif_count;
            if !notifier_had_subscribers {
                count -= 1;
            }
            let head = if is_tree_after || count == 1 {
                sub_head
            } else {
                None
            };
            (head, count)
        };

        self.apply_graph_mutation(
            subscriber,
            notifier,
            sub_graph,
            notif_graph,
            registry,
            is_tree_after,
            new_head,
            new_count,
        )?;

        debug!(
            %subscriber,
            %notifier,
            is_tree = is_tree_after,
            head = ?new_head,
            head_count = new_count,
            "subscription established"
        );
        Ok(true)
    }

    /// (tree, head, head count) of one endpoint, treating a single item as
    /// a trivial tree whose head is the item itself.
    fn side_metadata(
        &self,
        item: ItemId,
        graph: Option<GraphId>,
    ) -> Result<(bool, Option<ItemId>, usize)> {
        match graph {
            Some(gid) => {
                let graph = self.graph_lookup(gid)?;
                Ok((graph.is_tree_raw(), graph.head_raw(), graph.head_count()))
            }
            None => Ok((true, Some(item), 1)),
        }
    }

    /// Walk subscriber edges from `start` until the zero-subscriber item.
    fn find_head_upward(&self, start: ItemId) -> Option<ItemId> {
        let mut current = start;
        // Bounded by the item count; a well-formed net terminates sooner.
        for _ in 0..=self.items.len() {
            let state = self.items.get(&current)?;
            match state.subscribers.iter().next() {
                None => return Some(current),
                Some(&next) => current = next,
            }
        }
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_graph_mutation(
        &mut self,
        subscriber: ItemId,
        notifier: ItemId,
        sub_graph: Option<GraphId>,
        notif_graph: Option<GraphId>,
        registry: BehaviorRegistry,
        is_tree: bool,
        head: Option<ItemId>,
        head_count: usize,
    ) -> Result<()> {
        match (sub_graph, notif_graph) {
            (None, None) => {
                let gid = GraphId::new(self.next_graph);
                self.next_graph += 1;
                let mut graph = Graph::new(gid);
                graph.register_item(self.item(subscriber)?);
                graph.register_item(self.item(notifier)?);
                graph.install_registry(registry);
                graph.set_metadata(is_tree, head, head_count);
                self.graphs.insert(gid, graph);
                self.item_mut(subscriber)?.graph = Some(gid);
                self.item_mut(notifier)?.graph = Some(gid);
            }
            (None, Some(gid)) => {
                self.join_graph(gid, subscriber, registry, is_tree, head, head_count)?;
            }
            (Some(gid), None) => {
                self.join_graph(gid, notifier, registry, is_tree, head, head_count)?;
            }
            (Some(sg), Some(ng)) if sg == ng => {
                let graph = self
                    .graphs
                    .get_mut(&sg)
                    .ok_or(NotificationError::GraphDestroyed(sg))?;
                graph.install_registry(registry);
                graph.set_metadata(is_tree, head, head_count);
            }
            (Some(sg), Some(ng)) => {
                // Larger component survives; ties go to the subscriber's.
                let (winner_id, loser_id) = {
                    let sub_len = self.graph_lookup(sg)?.len()?;
                    let notif_len = self.graph_lookup(ng)?.len()?;
                    if notif_len > sub_len {
                        (ng, sg)
                    } else {
                        (sg, ng)
                    }
                };
                debug!(winner = %winner_id, loser = %loser_id, "merging graphs");
                let mut loser = self
                    .graphs
                    .remove(&loser_id)
                    .ok_or(NotificationError::GraphDestroyed(loser_id))?;
                for &member in loser.member_ids() {
                    if let Some(state) = self.items.get_mut(&member) {
                        state.graph = Some(winner_id);
                    }
                }
                let winner = self
                    .graphs
                    .get_mut(&winner_id)
                    .ok_or(NotificationError::GraphDestroyed(winner_id))?;
                winner.absorb(&mut loser);
                winner.install_registry(registry);
                winner.set_metadata(is_tree, head, head_count);
                self.graphs.insert(loser_id, loser);
            }
        }
        Ok(())
    }

    /// A single item joins an existing graph.
    fn join_graph(
        &mut self,
        gid: GraphId,
        joining: ItemId,
        registry: BehaviorRegistry,
        is_tree: bool,
        head: Option<ItemId>,
        head_count: usize,
    ) -> Result<()> {
        let state = self
            .items
            .get(&joining)
            .ok_or(NotificationError::UnknownItem(joining))?;
        let graph = self
            .graphs
            .get_mut(&gid)
            .ok_or(NotificationError::GraphDestroyed(gid))?;
        graph.register_item(state);
        graph.install_registry(registry);
        graph.set_metadata(is_tree, head, head_count);
        self.items
            .get_mut(&joining)
            .ok_or(NotificationError::UnknownItem(joining))?
            .graph = Some(gid);
        Ok(())
    }

    /// Remove the `subscriber` → `notifier` subscription.
    ///
    /// Fires `pre_unsubscribe` on every registered behavior, then removes
    /// the edge pair. Graph membership and tree/head metadata are *not*
    /// recomputed: removing the only connection between two subcomponents
    /// leaves both sides in the old graph with stale metadata. Callers
    /// that need fission must rebuild the affected component themselves.
    pub fn unsubscribe(&mut self, subscriber: ItemId, notifier: ItemId) -> Result<()> {
        if !self.item(subscriber)?.notifiers.contains(&notifier) {
            return Err(NotificationError::NotANotifier {
                subscriber,
                notifier,
            });
        }
        let registry = match self.item(subscriber)?.graph {
            Some(gid) => self.graph_lookup(gid)?.registry().clone(),
            None => BehaviorRegistry::new(),
        };
        for (behavior, related) in registry.iter() {
            behavior.pre_unsubscribe(self, subscriber, notifier, related)?;
        }
        self.item_mut(subscriber)?.notifiers.remove(&notifier);
        self.item_mut(notifier)?.subscribers.remove(&subscriber);
        debug!(%subscriber, %notifier, "unsubscribed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(net: &mut NotificationNet, len: usize) -> Vec<ItemId> {
        let items: Vec<ItemId> = (0..len).map(|_| net.add_item()).collect();
        for pair in items.windows(2) {
            net.subscribe(pair[0], pair[1]).unwrap();
        }
        items
    }

    #[test]
    fn test_first_edge_creates_tree() {
        let mut net = NotificationNet::new();
        let items = chain(&mut net, 2);

        let graph = net.graph_of(items[0]).expect("graph exists");
        assert!(graph.is_tree().unwrap());
        assert_eq!(graph.head().unwrap(), Some(items[0]));
        assert_eq!(graph.len().unwrap(), 2);
        assert!(net.is_head(items[0]).unwrap());
        assert!(net.is_head_of_tree(items[0]).unwrap());
        assert!(!net.is_head(items[1]).unwrap());
    }

    #[test]
    fn test_chain_stays_tree() {
        let mut net = NotificationNet::new();
        let items = chain(&mut net, 5);
        let graph = net.graph_of(items[4]).expect("graph exists");
        assert!(graph.is_tree().unwrap());
        assert_eq!(graph.head().unwrap(), Some(items[0]));
    }

    #[test]
    fn test_fanout_from_head_stays_tree() {
        let mut net = NotificationNet::new();
        let root = net.add_item();
        let left = net.add_item();
        let right = net.add_item();

        net.subscribe(root, left).unwrap();
        net.subscribe(root, right).unwrap();

        let graph = net.graph_of(root).expect("graph exists");
        assert!(graph.is_tree().unwrap());
        assert_eq!(graph.head().unwrap(), Some(root));
    }

    #[test]
    fn test_diamond_is_not_tree_but_has_head() {
        let mut net = NotificationNet::new();
        let top = net.add_item();
        let left = net.add_item();
        let right = net.add_item();
        let bottom = net.add_item();

        net.subscribe(top, left).unwrap();
        net.subscribe(top, right).unwrap();
        net.subscribe(left, bottom).unwrap();
        net.subscribe(right, bottom).unwrap();

        let graph = net.graph_of(top).expect("graph exists");
        assert!(!graph.is_tree().unwrap());
        assert_eq!(graph.head().unwrap(), Some(top));
    }

    #[test]
    fn test_same_graph_close_recomputes_head() {
        let mut net = NotificationNet::new();
        let a = net.add_item();
        let b = net.add_item();
        let c = net.add_item();

        net.subscribe(a, c).unwrap();
        net.subscribe(b, c).unwrap();
        // Two zero-subscriber items: a and b.
        let graph = net.graph_of(a).expect("graph exists");
        assert_eq!(graph.head().unwrap(), None);

        net.subscribe(a, b).unwrap();
        let graph = net.graph_of(a).expect("graph exists");
        assert_eq!(graph.head().unwrap(), Some(a));
        assert!(!graph.is_tree().unwrap());
    }

    #[test]
    fn test_merge_retargets_and_destroys_loser() {
        let mut net = NotificationNet::new();
        let left = chain(&mut net, 3);
        let right = chain(&mut net, 2);

        let left_gid = net.graph_of(left[0]).unwrap().id();
        let right_gid = net.graph_of(right[0]).unwrap().id();
        assert_ne!(left_gid, right_gid);

        net.subscribe(left[2], right[0]).unwrap();

        let merged = net.graph_of(left[0]).unwrap().id();
        for &item in left.iter().chain(&right) {
            assert_eq!(net.graph_of(item).unwrap().id(), merged);
        }
        let loser = if merged == left_gid { right_gid } else { left_gid };
        let tombstone = net.graph(loser).expect("tombstone kept");
        assert!(tombstone.is_destroyed());
        assert!(matches!(
            tombstone.len(),
            Err(NotificationError::GraphDestroyed(id)) if id == loser
        ));
    }

    #[test]
    fn test_merge_of_two_trees_head_rules() {
        let mut net = NotificationNet::new();
        // tree A: a0 <- a1 (a0 head), tree B: b0 <- b1 (b0 head)
        let a = chain(&mut net, 2);
        let b = chain(&mut net, 2);

        // a1 subscribes b0 (B's head): combined is a tree headed at a0.
        net.subscribe(a[1], b[0]).unwrap();
        let graph = net.graph_of(a[0]).unwrap();
        assert!(graph.is_tree().unwrap());
        assert_eq!(graph.head().unwrap(), Some(a[0]));
        assert_eq!(graph.len().unwrap(), 4);
    }

    #[test]
    fn test_merge_into_interior_leaves_two_heads() {
        let mut net = NotificationNet::new();
        let a = chain(&mut net, 2);
        let b = chain(&mut net, 2);

        // a1 subscribes b1 (not B's head): b0 and a0 both stay heads.
        net.subscribe(a[1], b[1]).unwrap();
        let graph = net.graph_of(a[0]).unwrap();
        assert!(!graph.is_tree().unwrap());
        assert_eq!(graph.head().unwrap(), None);
    }

    #[test]
    fn test_duplicate_subscribe_is_noop() {
        let mut net = NotificationNet::new();
        let a = net.add_item();
        let b = net.add_item();

        assert!(net.subscribe(a, b).unwrap());
        assert!(!net.subscribe(a, b).unwrap());
        assert_eq!(net.graph_of(a).unwrap().len().unwrap(), 2);
    }

    #[test]
    fn test_unsubscribe_keeps_membership() {
        let mut net = NotificationNet::new();
        let items = chain(&mut net, 3);

        net.unsubscribe(items[1], items[2]).unwrap();
        assert!(net.notifier_items(items[1]).unwrap().is_empty());
        assert!(net.subscriber_items(items[2]).unwrap().is_empty());
        // Membership is intentionally left as-is.
        assert!(net.graph_of(items[2]).is_some());
    }
}
