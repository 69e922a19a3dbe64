//! Items and notification types.
//!
//! An *item* is a node of the notification graph: it owns one attribute
//! set per attached notification type, its notifier/subscriber edge sets,
//! and a back-reference to the component it currently belongs to. Items
//! live in the flat store of a [`NotificationNet`](crate::NotificationNet)
//! and are addressed by [`ItemId`].
//!
//! A [`NotificationType`] is the immutable descriptor attached to items:
//! an identifier, the behavior that interprets its attributes, and default
//! attribute values cloned into every item the type is attached to.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attribute::AttributeSet;
use crate::behavior::NotificationBehavior;
use crate::graph::GraphId;

/// Notification type identifier. Two types with equal identifiers address
/// the same attribute sets, even when their behaviors differ.
pub type Identifier = String;

/// Handle to an item in a [`NotificationNet`](crate::NotificationNet).
///
/// Ids are never reused; a dangling id fails with
/// [`UnknownItem`](crate::NotificationError::UnknownItem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric form, for diagnostics.
    pub fn index(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Immutable descriptor: identifier + behavior + default attributes.
///
/// Defaults seed the owned layer of the attribute set created when the
/// type is attached; every item receives its own deep copy.
///
/// # Examples
///
/// ```rust
/// use notigraph_core::{NotificationType, NotifySubscribers};
/// use serde_json::json;
/// use std::rc::Rc;
///
/// let red_point = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()))
///     .with_default("activate", json!(false));
///
/// assert_eq!(red_point.identifier(), "red_point");
/// ```
#[derive(Clone)]
pub struct NotificationType {
    identifier: Identifier,
    behavior: Rc<dyn NotificationBehavior>,
    defaults: HashMap<String, Value>,
}

impl NotificationType {
    /// Create a type binding `identifier` to `behavior`, with no defaults.
    pub fn new(identifier: impl Into<Identifier>, behavior: Rc<dyn NotificationBehavior>) -> Self {
        Self {
            identifier: identifier.into(),
            behavior,
            defaults: HashMap::new(),
        }
    }

    /// Add a default attribute value, builder style.
    pub fn with_default(mut self, name: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(name.into(), value);
        self
    }

    /// The type identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The behavior interpreting this type's attributes.
    pub fn behavior(&self) -> &Rc<dyn NotificationBehavior> {
        &self.behavior
    }

    pub(crate) fn defaults(&self) -> &HashMap<String, Value> {
        &self.defaults
    }
}

impl fmt::Debug for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationType")
            .field("identifier", &self.identifier)
            .field("behavior", &self.behavior.name())
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// Stored state of one item.
///
/// Edge sets are kept symmetric by the subscription transaction: `a` is in
/// `b`'s subscribers iff `b` is in `a`'s notifiers. `BTreeSet` keeps
/// neighbor iteration deterministic.
pub(crate) struct ItemState {
    pub(crate) id: ItemId,
    /// type identifier → behavior, populated by `add_notification`
    pub(crate) behaviors: HashMap<Identifier, Rc<dyn NotificationBehavior>>,
    /// type identifier → attribute set; may hold sets for identifiers the
    /// item has no type for, written by propagation passing through
    pub(crate) attributes: HashMap<Identifier, AttributeSet>,
    /// items this one subscribes to (out-edges, propagation sources)
    pub(crate) notifiers: BTreeSet<ItemId>,
    /// items subscribing to this one (in-edges, propagation targets)
    pub(crate) subscribers: BTreeSet<ItemId>,
    /// current component; `None` iff the item has no edges yet
    pub(crate) graph: Option<GraphId>,
}

impl ItemState {
    pub(crate) fn new(id: ItemId) -> Self {
        Self {
            id,
            behaviors: HashMap::new(),
            attributes: HashMap::new(),
            notifiers: BTreeSet::new(),
            subscribers: BTreeSet::new(),
            graph: None,
        }
    }

    /// An item is single while it has no edges at all.
    pub(crate) fn is_single(&self) -> bool {
        self.graph.is_none()
    }
}

impl fmt::Debug for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&Identifier> = self.behaviors.keys().collect();
        types.sort();
        f.debug_struct("ItemState")
            .field("id", &self.id)
            .field("types", &types)
            .field("notifiers", &self.notifiers)
            .field("subscribers", &self.subscribers)
            .field("graph", &self.graph)
            .finish()
    }
}
