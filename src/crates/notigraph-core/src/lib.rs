//! # notigraph-core: in-process notification graph engine
//!
//! A dynamically built directed acyclic graph of *items* over which typed
//! *behaviors* propagate derived attribute state from notifiers (sources)
//! to subscribers (sinks). The canonical use is UI "red point" badges
//! (activate a leaf and every ancestor aggregating it lights up), but the
//! engine is domain-neutral: any monotone-per-edge aggregation (boolean
//! OR, integer sum, ...) can be expressed as a behavior.
//!
//! ## Core Concepts
//!
//! ### Items, notifiers and subscribers
//!
//! Items are graph nodes, created isolated and wired together with
//! [`subscribe`](NotificationNet::subscribe). `subscriber.subscribe(notifier)`
//! means state set on the notifier flows to the subscriber; in badge
//! terms, a folder subscribes to the mails inside it.
//!
//! ### Notification types and behaviors
//!
//! A [`NotificationType`] binds a type identifier to a
//! [`NotificationBehavior`] plus default attribute values. The behavior
//! decides what reads and writes mean: [`NotifySubscribers`] implements
//! boolean OR, [`CountAttribute`] an additive counter, and the
//! [`NotificationBehavior`] trait is open for custom aggregations.
//!
//! ### Owned and inherited layers
//!
//! Each (item, type) pair stores an [`AttributeSet`] with two layers:
//! values authored on the item itself, and values aggregated from its
//! transitive notifiers. The *gathered* value a caller reads combines
//! both, behavior-defined.
//!
//! ### Graphs
//!
//! Connected components are tracked as short-lived [`Graph`] descriptors
//! carrying the behavior registry, the cross-behavior interest index, and
//! tree/head metadata for fast traversal. Components merge automatically
//! when an edge joins them; the losing descriptor becomes a tombstone
//! that rejects every read.
//!
//! ## Quick Start
//!
//! ```rust
//! use notigraph_core::{NotificationNet, NotificationType, NotifySubscribers};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let red_point = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()));
//!
//! let mut net = NotificationNet::new();
//! let folder = net.add_item();
//! let mail_a = net.add_item();
//! let mail_b = net.add_item();
//! for item in [folder, mail_a, mail_b] {
//!     net.add_notification(item, &red_point)?;
//! }
//!
//! net.subscribe(folder, mail_a)?;
//! net.subscribe(folder, mail_b)?;
//!
//! net.notification(mail_a, "red_point")?.set_attribute("activate", json!(true))?;
//! assert_eq!(
//!     net.notification(folder, "red_point")?.get_attribute("activate")?,
//!     json!(true)
//! );
//!
//! // The badge is sticky: it survives until the last source goes out.
//! net.notification(mail_a, "red_point")?.set_attribute("activate", json!(false))?;
//! assert_eq!(
//!     net.notification(folder, "red_point")?.get_attribute("activate")?,
//!     json!(false)
//! );
//! # Ok::<(), notigraph_core::NotificationError>(())
//! ```
//!
//! ## Counting instead of flagging
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
//! let (a, b) = (net.add_item(), net.add_item());
//! net.add_notification(counter, &red_counter)?;
//! net.add_notification(a, &red_point)?;
//! net.add_notification(b, &red_point)?;
//! net.subscribe(counter, a)?;
//! net.subscribe(counter, b)?;
//!
//! net.notification(a, "red_point")?.set_attribute("activate", json!(true))?;
//! net.notification(b, "red_point")?.set_attribute("activate", json!(true))?;
//! assert_eq!(
//!     net.notification(counter, "red_point")?.get_attribute("count_activate")?,
//!     json!(2)
//! );
//! # Ok::<(), notigraph_core::NotificationError>(())
//! ```
//!
//! ## Scope
//!
//! The engine is single-threaded and synchronous: every call completes
//! before returning, nested propagation included. There is no
//! persistence, no distribution, and no cyclic-graph support; a
//! subscription that would close a cycle is rejected before any
//! mutation.

pub mod attribute;
pub mod behavior;
pub mod behaviors;
pub mod error;
pub mod graph;
pub mod item;
pub mod net;
pub mod util;
pub mod visualization;
pub mod walk;

pub use attribute::{AttributeHandle, AttributeSet};
pub use behavior::{AttributeRef, NotificationBehavior};
pub use behaviors::{CountAttribute, CountFn, NotifySubscribers};
pub use error::{NotificationError, Result};
pub use graph::{Graph, GraphId};
pub use item::{Identifier, ItemId, NotificationType};
pub use net::NotificationNet;
pub use visualization::{visualize, VisualizationFormat, VisualizationOptions};
pub use walk::{OnFailedAssertion, Walk, WalkDirection, WalkOptions};
