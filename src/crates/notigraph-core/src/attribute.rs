//! Attribute storage: the two-layer key→value maps behaviors read and write.
//!
//! Every (item, notification type) pair owns one [`AttributeSet`] holding
//! two independent layers:
//!
//! - **Owned**: values authored on the item itself, by its own behavior or
//!   by seeding defaults when the type is attached.
//! - **Inherited**: values aggregated from transitively reachable notifiers.
//!   Any behavior anywhere in the graph may write this layer while it
//!   propagates.
//!
//! The *gathered* value a caller sees through
//! [`AttributeHandle::get_attribute`] is a behavior-defined combination of
//! the two layers (boolean OR, integer sum, ...). The set itself has no
//! opinion: it stores [`serde_json::Value`]s and nothing else.
//!
//! # Examples
//!
//! ```rust
//! use notigraph_core::AttributeSet;
//! use serde_json::json;
//!
//! let mut set = AttributeSet::new();
//! set.set_owned("activate", json!(true));
//! set.set_inherited("count_activate", json!(3));
//!
//! assert_eq!(set.owned("activate"), Some(&json!(true)));
//! assert!(!set.has_owned("count_activate"));
//! assert_eq!(set.inherited_or("count_activate", json!(0)), json!(3));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::item::{Identifier, ItemId};
use crate::net::NotificationNet;

/// Two-layer attribute storage for one (item, notification type) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeSet {
    owned: HashMap<String, Value>,
    inherited: HashMap<String, Value>,
}

impl AttributeSet {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the owned layer from a defaults map. Values are cloned, so
    /// items never share default instances.
    pub(crate) fn seeded(defaults: &HashMap<String, Value>) -> Self {
        Self {
            owned: defaults.clone(),
            inherited: HashMap::new(),
        }
    }

    /// Value authored on this item, if any.
    pub fn owned(&self, name: &str) -> Option<&Value> {
        self.owned.get(name)
    }

    /// Owned value, or `default` when the name is absent.
    pub fn owned_or(&self, name: &str, default: Value) -> Value {
        self.owned.get(name).cloned().unwrap_or(default)
    }

    /// Whether the owned layer has an entry for `name`.
    pub fn has_owned(&self, name: &str) -> bool {
        self.owned.contains_key(name)
    }

    /// Write the owned layer.
    pub fn set_owned(&mut self, name: impl Into<String>, value: Value) {
        self.owned.insert(name.into(), value);
    }

    /// Value aggregated from reachable notifiers, if any.
    pub fn inherited(&self, name: &str) -> Option<&Value> {
        self.inherited.get(name)
    }

    /// Inherited value, or `default` when the name is absent.
    pub fn inherited_or(&self, name: &str, default: Value) -> Value {
        self.inherited.get(name).cloned().unwrap_or(default)
    }

    /// Whether the inherited layer has an entry for `name`.
    pub fn has_inherited(&self, name: &str) -> bool {
        self.inherited.contains_key(name)
    }

    /// Write the inherited layer.
    pub fn set_inherited(&mut self, name: impl Into<String>, value: Value) {
        self.inherited.insert(name.into(), value);
    }

    /// Iterate the owned layer.
    pub fn iter_owned(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.owned.iter()
    }

    /// Iterate the inherited layer.
    pub fn iter_inherited(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inherited.iter()
    }
}

/// Access point for the attributes of one notification type on one item.
///
/// A handle is the only surface through which callers touch attribute
/// state: every read and write dispatches through the behavior registered
/// for the type, which applies interest hooks and propagation. Obtain one
/// with [`NotificationNet::notification`].
///
/// # Examples
///
/// ```rust
/// use notigraph_core::{NotificationNet, NotificationType, NotifySubscribers};
/// use serde_json::json;
/// use std::rc::Rc;
///
/// let mut net = NotificationNet::new();
/// let red_point = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()));
///
/// let item = net.add_item();
/// net.add_notification(item, &red_point)?;
///
/// net.notification(item, "red_point")?.set_attribute("activate", json!(true))?;
/// let value = net.notification(item, "red_point")?.get_attribute("activate")?;
/// assert_eq!(value, json!(true));
/// # Ok::<(), notigraph_core::NotificationError>(())
/// ```
pub struct AttributeHandle<'net> {
    net: &'net mut NotificationNet,
    item: ItemId,
    identifier: Identifier,
}

impl<'net> AttributeHandle<'net> {
    pub(crate) fn new(net: &'net mut NotificationNet, item: ItemId, identifier: Identifier) -> Self {
        Self {
            net,
            item,
            identifier,
        }
    }

    /// The item this handle points at.
    pub fn item(&self) -> ItemId {
        self.item
    }

    /// The notification type identifier this handle goes through.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Gathered value of `name`, as defined by the type's behavior.
    ///
    /// Fails with [`UnknownAttribute`](crate::NotificationError::UnknownAttribute)
    /// when the behavior does not recognize the name.
    pub fn get_attribute(&self, name: &str) -> Result<Value> {
        self.net.get_attribute(self.item, &self.identifier, name)
    }

    /// Write `name`, dispatching through interest hooks and the owning
    /// behavior. Propagation across the graph happens before this returns.
    pub fn set_attribute(&mut self, name: &str, value: Value) -> Result<()> {
        self.net
            .set_attribute(self.item, &self.identifier, name, value)
    }
}
