//! Error types for notification graph operations.
//!
//! All fallible operations in this crate return [`Result`], an alias for
//! `std::result::Result<T, NotificationError>`. Structural errors (cycles,
//! self-subscription) are reported *before* any mutation takes place;
//! attribute-level errors propagate to the caller verbatim.
//!
//! # Examples
//!
//! ```rust
//! use notigraph_core::{NotificationNet, NotificationError};
//!
//! let mut net = NotificationNet::new();
//! let item = net.add_item();
//!
//! match net.subscribe(item, item) {
//!     Err(NotificationError::SelfSubscription(id)) => {
//!         assert_eq!(id, item);
//!     }
//!     other => panic!("expected self-subscription error, got {:?}", other),
//! }
//! ```

use thiserror::Error;

use crate::graph::GraphId;
use crate::item::ItemId;

/// Convenience result type using [`NotificationError`].
pub type Result<T> = std::result::Result<T, NotificationError>;

/// Error type for all notification graph operations.
///
/// Structural variants (`SelfSubscription`, `CircularSubscription`) are
/// raised before edges are touched, so a failed `subscribe` leaves the
/// graph exactly as it was. Attribute variants surface behavior-level
/// failures at the handle that triggered them.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// An item tried to subscribe to itself.
    #[error("item {0} cannot subscribe to itself")]
    SelfSubscription(ItemId),

    /// The requested subscription would close a cycle.
    ///
    /// Raised by the pre-check that walks downstream from the notifier
    /// looking for the subscriber. Nothing has been mutated when this
    /// is returned.
    #[error("subscribing {subscriber} to {notifier} would create a cycle")]
    CircularSubscription {
        /// The item that attempted the subscription
        subscriber: ItemId,
        /// The item it tried to subscribe to
        notifier: ItemId,
    },

    /// No behavior on the notification type handles the attribute name.
    #[error("notification '{identifier}' has no attribute '{attribute}'")]
    UnknownAttribute {
        /// Type identifier the access went through
        identifier: String,
        /// The unrecognized attribute name
        attribute: String,
    },

    /// `add_notification` with an identifier the item already carries.
    #[error("notification type '{identifier}' already attached to {item}")]
    DuplicateNotificationType {
        /// The target item
        item: ItemId,
        /// The colliding type identifier
        identifier: String,
    },

    /// The item does not carry the requested notification type.
    #[error("notification type '{identifier}' not attached to {item}")]
    MissingNotificationType {
        /// The target item
        item: ItemId,
        /// The missing type identifier
        identifier: String,
    },

    /// `unsubscribe` for an edge that does not exist.
    #[error("{notifier} is not a notifier of {subscriber}")]
    NotANotifier {
        /// The item that attempted the unsubscription
        subscriber: ItemId,
        /// The item that is not among its notifiers
        notifier: ItemId,
    },

    /// Observation of a graph that was destroyed by a merge.
    ///
    /// After two components merge, the losing [`Graph`](crate::Graph) is a
    /// tombstone; any read through a stale [`GraphId`] lands here.
    #[error("graph {0} was destroyed by a merge and can no longer be observed")]
    GraphDestroyed(GraphId),

    /// A behavior received a value of the wrong type.
    #[error("attribute '{attribute}' expects {expected}, got {value}")]
    TypeMismatch {
        /// The attribute that was written
        attribute: String,
        /// Human-readable description of the expected type
        expected: &'static str,
        /// The offending value
        value: serde_json::Value,
    },

    /// An [`ItemId`] that was never handed out by this net.
    #[error("unknown item {0}")]
    UnknownItem(ItemId),
}

impl NotificationError {
    /// Create an [`UnknownAttribute`](Self::UnknownAttribute) error.
    pub fn unknown_attribute(identifier: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            identifier: identifier.into(),
            attribute: attribute.into(),
        }
    }

    /// Create a [`TypeMismatch`](Self::TypeMismatch) error.
    pub fn type_mismatch(
        attribute: impl Into<String>,
        expected: &'static str,
        value: serde_json::Value,
    ) -> Self {
        Self::TypeMismatch {
            attribute: attribute.into(),
            expected,
            value,
        }
    }
}
