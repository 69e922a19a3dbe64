//! Built-in propagation behaviors.
//!
//! Two reference behaviors ship with the engine:
//!
//! - [`NotifySubscribers`]: boolean OR. An item that turns its flag on
//!   makes every transitive subscriber report the flag as on. This is the
//!   classic UI "red point": activate a leaf badge and every ancestor
//!   aggregating it lights up.
//! - [`CountAttribute`]: additive counter. Observes writes to source
//!   attributes anywhere in the graph and accumulates per-item counts
//!   under separate storage names, so an ancestor can show *how many*
//!   descendants are activated rather than just *whether* one is.
//!
//! Both express their aggregate entirely through the behavior protocol;
//! the engine never learns what OR or SUM mean.
//!
//! # Examples
//!
//! ```rust
//! use notigraph_core::{CountAttribute, NotificationNet, NotificationType, NotifySubscribers};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let red_point = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()));
//! let red_counter = NotificationType::new(
//!     "red_point",
//!     Rc::new(CountAttribute::new().count("activate", "count_activate")),
//! );
//!
//! let mut net = NotificationNet::new();
//! let counter = net.add_item();
//! let badge = net.add_item();
//! net.add_notification(counter, &red_counter)?;
//! net.add_notification(badge, &red_point)?;
//! net.subscribe(counter, badge)?;
//!
//! net.notification(badge, "red_point")?.set_attribute("activate", json!(true))?;
//! let count = net.notification(counter, "red_point")?.get_attribute("count_activate")?;
//! assert_eq!(count, json!(1));
//! # Ok::<(), notigraph_core::NotificationError>(())
//! ```

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::trace;

use crate::attribute::AttributeSet;
use crate::behavior::{AttributeRef, NotificationBehavior};
use crate::error::{NotificationError, Result};
use crate::item::{Identifier, ItemId};
use crate::net::NotificationNet;
use crate::util::truthy;

/// Boolean-OR propagation: subscribers of an activated item appear
/// activated themselves.
///
/// The gathered value is `owned OR inherited`. Setting the flag walks
/// strict subscribers: turning it on marks their inherited layer, turning
/// it off clears inherited marks, but only on items none of whose
/// remaining notifiers still contribute `true`. An item lit up by two
/// descendants stays lit until both go out.
pub struct NotifySubscribers {
    attribute_name: String,
}

impl NotifySubscribers {
    /// Propagate the boolean attribute called `attribute_name`.
    pub fn new(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
        }
    }

    /// Name of the propagated attribute.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    fn gathered(&self, set: &AttributeSet) -> bool {
        set.owned(&self.attribute_name).map(truthy).unwrap_or(false)
            || set
                .inherited(&self.attribute_name)
                .map(truthy)
                .unwrap_or(false)
    }

    /// Set the inherited flag on every reachable subscriber, stopping at
    /// items that are already marked.
    fn mark_reachable(
        &self,
        net: &mut NotificationNet,
        start: Vec<ItemId>,
        identifier: &str,
    ) -> Result<()> {
        let mut stack = start;
        while let Some(item) = stack.pop() {
            {
                let set = net.ensure_attribute_set(item, identifier)?;
                if set
                    .inherited(&self.attribute_name)
                    .map(truthy)
                    .unwrap_or(false)
                {
                    continue;
                }
                set.set_inherited(self.attribute_name.as_str(), Value::Bool(true));
            }
            trace!(%item, identifier, "inherited flag set");
            stack.extend(net.subscriber_items(item)?);
        }
        Ok(())
    }

    /// Clear inherited flags upward from a deactivated notifier. An item
    /// keeps its flag while any of its notifiers still gathers `true`.
    fn clear_reachable(
        &self,
        net: &mut NotificationNet,
        start: Vec<ItemId>,
        identifier: &str,
    ) -> Result<()> {
        let mut stack = start;
        while let Some(item) = stack.pop() {
            let marked = net
                .attribute_set(item, identifier)
                .and_then(|set| set.inherited(&self.attribute_name))
                .map(truthy)
                .unwrap_or(false);
            if !marked {
                continue;
            }
            let still_contributing = net.notifier_items(item)?.into_iter().any(|notifier| {
                net.attribute_set(notifier, identifier)
                    .map(|set| self.gathered(set))
                    .unwrap_or(false)
            });
            if still_contributing {
                continue;
            }
            if let Some(set) = net.attribute_set_mut(item, identifier) {
                set.set_inherited(self.attribute_name.as_str(), Value::Bool(false));
            }
            trace!(%item, identifier, "inherited flag cleared");
            stack.extend(net.subscriber_items(item)?);
        }
        Ok(())
    }
}

impl Default for NotifySubscribers {
    /// The conventional red-point flag, `activate`.
    fn default() -> Self {
        Self::new("activate")
    }
}

impl NotificationBehavior for NotifySubscribers {
    fn name(&self) -> &str {
        "notify_subscribers"
    }

    fn get_attribute(&self, net: &NotificationNet, at: &AttributeRef, name: &str) -> Result<Value> {
        if name != self.attribute_name {
            return Err(NotificationError::unknown_attribute(&at.identifier, name));
        }
        let gathered = net
            .attribute_set(at.item, &at.identifier)
            .map(|set| self.gathered(set))
            .unwrap_or(false);
        Ok(Value::Bool(gathered))
    }

    fn set_attribute(
        &self,
        net: &mut NotificationNet,
        at: &AttributeRef,
        name: &str,
        value: Value,
    ) -> Result<()> {
        if name != self.attribute_name {
            return Err(NotificationError::unknown_attribute(&at.identifier, name));
        }
        let flag = match value {
            Value::Bool(flag) => flag,
            other => return Err(NotificationError::type_mismatch(name, "a boolean", other)),
        };
        let changed = {
            let set = net.ensure_attribute_set(at.item, &at.identifier)?;
            let before = self.gathered(set);
            set.set_owned(name, Value::Bool(flag));
            self.gathered(set) != before
        };
        if !changed {
            return Ok(());
        }
        let subscribers = net.subscriber_items(at.item)?;
        if flag {
            self.mark_reachable(net, subscribers, &at.identifier)
        } else {
            self.clear_reachable(net, subscribers, &at.identifier)
        }
    }

    fn pre_subscribe(
        &self,
        net: &mut NotificationNet,
        subscriber: ItemId,
        notifier: ItemId,
        related: &HashSet<Identifier>,
    ) -> Result<()> {
        for identifier in related {
            let activated = net
                .attribute_set(notifier, identifier)
                .map(|set| self.gathered(set))
                .unwrap_or(false);
            if activated {
                self.mark_reachable(net, vec![subscriber], identifier)?;
            }
        }
        Ok(())
    }
}

/// Conversion from an attribute value to its count contribution.
pub type CountFn = Box<dyn Fn(&Value) -> i64>;

struct CountSpec {
    storage: String,
    count: CountFn,
}

/// Additive counter over observed source attributes.
///
/// For every configured source attribute the counter declares interest,
/// so writes to that attribute anywhere in the graph reach it before the
/// owning behavior commits them. The write is converted into a delta
/// (`count(new) − count(old)`) and added to the inherited layer of the
/// written item and every reachable subscriber, each visited at most once
/// per propagation, so a diamond never counts twice.
///
/// Counts live under separate *storage* names (`activate` →
/// `count_activate` by convention). Direct integer writes to a storage
/// name are allowed and propagate their explicit delta the same way.
///
/// Counts only flow across edges that exist when the write happens;
/// subscribing to an already-counted subtree does not back-fill the new
/// edge.
pub struct CountAttribute {
    counted: HashMap<String, CountSpec>,
    storages: HashSet<String>,
}

impl CountAttribute {
    /// Counter with no configured attributes; chain [`count`](Self::count)
    /// or [`count_with`](Self::count_with) to configure.
    pub fn new() -> Self {
        Self {
            counted: HashMap::new(),
            storages: HashSet::new(),
        }
    }

    /// Count `source` writes into `storage` using
    /// [`default_count`](Self::default_count).
    pub fn count(self, source: impl Into<String>, storage: impl Into<String>) -> Self {
        self.count_with(source, storage, Self::default_count)
    }

    /// Count `source` writes into `storage` with a custom conversion.
    ///
    /// # Panics
    ///
    /// When `storage` collides with a counted source attribute name; the
    /// two namespaces must stay disjoint or the counter would observe its
    /// own storage writes.
    pub fn count_with(
        mut self,
        source: impl Into<String>,
        storage: impl Into<String>,
        count: impl Fn(&Value) -> i64 + 'static,
    ) -> Self {
        let source = source.into();
        let storage = storage.into();
        assert!(
            storage != source
                && !self.counted.contains_key(&storage)
                && !self.storages.contains(&source),
            "counted attribute '{source}' and storage '{storage}' must stay disjoint"
        );
        self.storages.insert(storage.clone());
        self.counted.insert(
            source,
            CountSpec {
                storage,
                count: Box::new(count),
            },
        );
        self
    }

    /// Integer values count as themselves; anything else counts 1 when
    /// truthy, 0 otherwise.
    pub fn default_count(value: &Value) -> i64 {
        match value.as_i64() {
            Some(n) => n,
            None => i64::from(truthy(value)),
        }
    }

    fn stored(set: Option<&AttributeSet>, name: &str) -> i64 {
        set.map(|set| {
            let owned = set.owned(name).and_then(Value::as_i64).unwrap_or(0);
            let inherited = set.inherited(name).and_then(Value::as_i64).unwrap_or(0);
            owned + inherited
        })
        .unwrap_or(0)
    }

    /// Add `delta` to the inherited storage of every item reachable from
    /// `start`, visiting each at most once.
    fn modify_counts(
        &self,
        net: &mut NotificationNet,
        start: Vec<ItemId>,
        identifier: &str,
        storage: &str,
        delta: i64,
        visited: &mut HashSet<ItemId>,
    ) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let mut stack = start;
        while let Some(item) = stack.pop() {
            if !visited.insert(item) {
                continue;
            }
            {
                let set = net.ensure_attribute_set(item, identifier)?;
                let current = set.inherited(storage).and_then(Value::as_i64).unwrap_or(0);
                set.set_inherited(storage, Value::from(current + delta));
            }
            trace!(%item, identifier, storage, delta, "count adjusted");
            stack.extend(net.subscriber_items(item)?);
        }
        Ok(())
    }
}

impl Default for CountAttribute {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBehavior for CountAttribute {
    fn name(&self) -> &str {
        "count_attribute"
    }

    fn interested_attributes(&self) -> Vec<String> {
        self.counted.keys().cloned().collect()
    }

    fn get_attribute(&self, net: &NotificationNet, at: &AttributeRef, name: &str) -> Result<Value> {
        if !self.storages.contains(name) {
            return Err(NotificationError::unknown_attribute(&at.identifier, name));
        }
        Ok(Value::from(Self::stored(
            net.attribute_set(at.item, &at.identifier),
            name,
        )))
    }

    fn set_attribute(
        &self,
        net: &mut NotificationNet,
        at: &AttributeRef,
        name: &str,
        value: Value,
    ) -> Result<()> {
        if self.storages.contains(name) {
            // Direct write to a count storage.
            let explicit = match value.as_i64() {
                Some(n) => n,
                None => {
                    return Err(NotificationError::type_mismatch(name, "an integer", value))
                }
            };
            let old = {
                let set = net.ensure_attribute_set(at.item, &at.identifier)?;
                let old = set.owned(name).and_then(Value::as_i64).unwrap_or(0);
                set.set_owned(name, value);
                old
            };
            let start = net.subscriber_items(at.item)?;
            let mut visited = HashSet::new();
            self.modify_counts(net, start, &at.identifier, name, explicit - old, &mut visited)
        } else if let Some(spec) = self.counted.get(name) {
            // Observed write to a counted source attribute. The owning
            // behavior commits the value itself; only the delta matters
            // here.
            let old_value = net
                .attribute_set(at.item, &at.identifier)
                .and_then(|set| set.owned(name).cloned());
            let delta = match old_value {
                Some(old) => (spec.count)(&value) - (spec.count)(&old),
                None => (spec.count)(&value),
            };
            let mut visited = HashSet::new();
            self.modify_counts(
                net,
                vec![at.item],
                &at.identifier,
                &spec.storage,
                delta,
                &mut visited,
            )
        } else {
            Err(NotificationError::unknown_attribute(&at.identifier, name))
        }
    }
}
