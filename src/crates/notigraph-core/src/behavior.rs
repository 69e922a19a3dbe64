//! The behavior protocol: the contract propagation strategies implement.
//!
//! A *behavior* decides what an attribute write means: which layer it
//! lands in, how far it propagates, and how the two layers combine into
//! the value a caller reads back. The engine stays agnostic: it routes
//! writes to behaviors and calls their subscription hooks at the right
//! moments, and the behaviors do the rest.
//!
//! A single behavior instance may back many notification types on many
//! items; instances are compared by identity, never by value.
//!
//! # Implementing a behavior
//!
//! ```rust
//! use notigraph_core::{
//!     AttributeRef, NotificationBehavior, NotificationError, NotificationNet, Result,
//! };
//! use serde_json::{json, Value};
//!
//! /// Keeps the maximum value ever written, with no propagation.
//! struct HighWater;
//!
//! impl NotificationBehavior for HighWater {
//!     fn name(&self) -> &str {
//!         "high_water"
//!     }
//!
//!     fn get_attribute(&self, net: &NotificationNet, at: &AttributeRef, name: &str) -> Result<Value> {
//!         if name != "level" {
//!             return Err(NotificationError::unknown_attribute(&at.identifier, name));
//!         }
//!         Ok(net
//!             .attribute_set(at.item, &at.identifier)
//!             .map(|set| set.owned_or("level", json!(0)))
//!             .unwrap_or(json!(0)))
//!     }
//!
//!     fn set_attribute(
//!         &self,
//!         net: &mut NotificationNet,
//!         at: &AttributeRef,
//!         name: &str,
//!         value: Value,
//!     ) -> Result<()> {
//!         if name != "level" {
//!             return Err(NotificationError::unknown_attribute(&at.identifier, name));
//!         }
//!         let set = net.ensure_attribute_set(at.item, &at.identifier)?;
//!         let current = set.owned_or("level", json!(0));
//!         if value.as_i64() > current.as_i64() {
//!             set.set_owned("level", value);
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::item::{Identifier, ItemId};
use crate::net::NotificationNet;

/// Address of an attribute set: the item plus the notification type
/// identifier the access goes through. Passed to every behavior call so
/// a shared behavior instance knows which state it is operating on.
#[derive(Debug, Clone)]
pub struct AttributeRef {
    /// The item whose attribute set is addressed
    pub item: ItemId,
    /// The notification type identifier on that item
    pub identifier: Identifier,
}

impl AttributeRef {
    pub(crate) fn new(item: ItemId, identifier: impl Into<Identifier>) -> Self {
        Self {
            item,
            identifier: identifier.into(),
        }
    }
}

/// Propagation strategy for a family of attributes.
///
/// Behaviors must honor three rules so that propagation, graph merges and
/// dynamic edge insertion stay consistent:
///
/// 1. `get_attribute` / `set_attribute` fail with
///    [`UnknownAttribute`](crate::NotificationError::UnknownAttribute) for
///    names they do not handle, and never swallow errors.
/// 2. `pre_subscribe` must leave the combined graph with the same
///    aggregate state a full recomputation over the new edge set would
///    produce.
/// 3. No hook may call `subscribe` or `unsubscribe`; the subscription
///    transaction is not re-entrant.
pub trait NotificationBehavior {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Attribute names this behavior wants to observe on *other* types.
    ///
    /// A write to a listed name anywhere in the graph invokes this
    /// behavior's `set_attribute` before the owning behavior runs, even on
    /// items that do not carry this behavior. Read once when the behavior
    /// first enters a graph; later changes have no effect.
    fn interested_attributes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Gathered value of `name` at `at`.
    fn get_attribute(&self, net: &NotificationNet, at: &AttributeRef, name: &str) -> Result<Value>;

    /// Apply a write of `name` at `at`, propagating as the behavior
    /// requires.
    fn set_attribute(
        &self,
        net: &mut NotificationNet,
        at: &AttributeRef,
        name: &str,
        value: Value,
    ) -> Result<()>;

    /// Called once per behavior before a new edge is inserted.
    ///
    /// `related` holds the type identifiers currently bound to this
    /// behavior in the combined graph. The edge does not exist yet when
    /// this runs; use it to merge aggregates across the edge about to
    /// appear.
    fn pre_subscribe(
        &self,
        net: &mut NotificationNet,
        subscriber: ItemId,
        notifier: ItemId,
        related: &HashSet<Identifier>,
    ) -> Result<()> {
        let _ = (net, subscriber, notifier, related);
        Ok(())
    }

    /// Called once per behavior before an edge is removed.
    fn pre_unsubscribe(
        &self,
        net: &mut NotificationNet,
        subscriber: ItemId,
        notifier: ItemId,
        related: &HashSet<Identifier>,
    ) -> Result<()> {
        let _ = (net, subscriber, notifier, related);
        Ok(())
    }
}

/// Identity comparison for shared behavior instances.
///
/// Compares the data pointers of the two `Rc`s. Comparing fat pointers
/// directly would also compare vtable addresses, which are not unique
/// across codegen units.
pub(crate) fn same_behavior(
    a: &Rc<dyn NotificationBehavior>,
    b: &Rc<dyn NotificationBehavior>,
) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

/// behavior → set of type identifiers bound to it within one graph.
///
/// Keyed by behavior identity. The registry travels with the graph,
/// merges when graphs merge, and supplies the `related` identifier sets
/// handed to subscription hooks.
#[derive(Clone, Default)]
pub struct BehaviorRegistry {
    entries: Vec<(Rc<dyn NotificationBehavior>, HashSet<Identifier>)>,
}

impl BehaviorRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Build a registry from one item's type → behavior map.
    pub(crate) fn from_item(behaviors: &HashMap<Identifier, Rc<dyn NotificationBehavior>>) -> Self {
        let mut registry = Self::new();
        registry.extend_from_item(behaviors);
        registry
    }

    /// Bind `identifier` to `behavior`, creating the entry if the behavior
    /// is new to this registry.
    pub(crate) fn insert(&mut self, behavior: &Rc<dyn NotificationBehavior>, identifier: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| same_behavior(existing, behavior))
        {
            Some((_, identifiers)) => {
                identifiers.insert(identifier.to_string());
            }
            None => {
                let mut identifiers = HashSet::new();
                identifiers.insert(identifier.to_string());
                self.entries.push((Rc::clone(behavior), identifiers));
            }
        }
    }

    /// Add every binding of an item.
    pub(crate) fn extend_from_item(
        &mut self,
        behaviors: &HashMap<Identifier, Rc<dyn NotificationBehavior>>,
    ) {
        for (identifier, behavior) in behaviors {
            self.insert(behavior, identifier);
        }
    }

    /// Union another registry into this one.
    pub(crate) fn merge(&mut self, other: &BehaviorRegistry) {
        for (behavior, identifiers) in &other.entries {
            for identifier in identifiers {
                self.insert(behavior, identifier);
            }
        }
    }

    /// Iterate (behavior, bound identifiers) pairs.
    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (&Rc<dyn NotificationBehavior>, &HashSet<Identifier>)> {
        self.entries.iter().map(|(b, ids)| (b, ids))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (behavior, identifiers) in &self.entries {
            map.entry(&behavior.name(), identifiers);
        }
        map.finish()
    }
}
