//! Lazy traversal over notifier or subscriber edges.
//!
//! [`Walk`] is a depth-first iterator over the items reachable from a
//! starting item, following either notifier edges (downstream, toward
//! propagation sources) or subscriber edges (upstream, toward propagation
//! targets). When the starting item's component is known to be a tree the
//! walk skips the visited set entirely; each item can only be reached
//! once by construction.
//!
//! An optional assertion filters items before they are yielded: a failing
//! item either stops the whole walk or is skipped together with the
//! subtree behind it.
//!
//! # Examples
//!
//! ```rust
//! use notigraph_core::{NotificationNet, WalkOptions};
//!
//! let mut net = NotificationNet::new();
//! let (parent, child, leaf) = (net.add_item(), net.add_item(), net.add_item());
//! net.subscribe(parent, child)?;
//! net.subscribe(child, leaf)?;
//!
//! let downstream: Vec<_> = net.walk_through(parent, WalkOptions::downstream())?.collect();
//! assert_eq!(downstream, vec![parent, child, leaf]);
//!
//! let upstream: Vec<_> = net.walk_through(leaf, WalkOptions::upstream())?.collect();
//! assert_eq!(upstream, vec![leaf, child, parent]);
//! # Ok::<(), notigraph_core::NotificationError>(())
//! ```

use std::collections::HashSet;

use crate::item::ItemId;
use crate::net::NotificationNet;

/// Which edge set a walk follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDirection {
    /// Follow notifier edges, toward propagation sources.
    Downstream,
    /// Follow subscriber edges, toward propagation targets.
    Upstream,
}

/// What to do with the subtree behind an item that fails the assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailedAssertion {
    /// Stop the whole walk.
    Terminate,
    /// Skip the item and everything behind it, keep walking elsewhere.
    SkipSubtree,
}

/// Configuration for [`NotificationNet::walk_through`].
pub struct WalkOptions {
    pub(crate) direction: WalkDirection,
    pub(crate) assertion: Option<Box<dyn Fn(&NotificationNet, ItemId) -> bool>>,
    pub(crate) on_failed: OnFailedAssertion,
}

impl WalkOptions {
    /// Walk notifier edges (the default direction of propagation checks).
    pub fn downstream() -> Self {
        Self {
            direction: WalkDirection::Downstream,
            assertion: None,
            on_failed: OnFailedAssertion::SkipSubtree,
        }
    }

    /// Walk subscriber edges.
    pub fn upstream() -> Self {
        Self {
            direction: WalkDirection::Upstream,
            assertion: None,
            on_failed: OnFailedAssertion::SkipSubtree,
        }
    }

    /// Apply `assertion` to every item before yielding it.
    pub fn with_assertion(
        mut self,
        assertion: impl Fn(&NotificationNet, ItemId) -> bool + 'static,
    ) -> Self {
        self.assertion = Some(Box::new(assertion));
        self
    }

    /// Stop the whole walk when the assertion fails, instead of skipping
    /// the failing subtree.
    pub fn terminate_on_failure(mut self) -> Self {
        self.on_failed = OnFailedAssertion::Terminate;
        self
    }
}

impl std::fmt::Debug for WalkOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkOptions")
            .field("direction", &self.direction)
            .field("assertion", &self.assertion.as_ref().map(|_| "<fn>"))
            .field("on_failed", &self.on_failed)
            .finish()
    }
}

/// Depth-first item iterator; see the module docs.
pub struct Walk<'net> {
    net: &'net NotificationNet,
    stack: Vec<ItemId>,
    /// `None` on the tree fast path
    visited: Option<HashSet<ItemId>>,
    options: WalkOptions,
    terminated: bool,
}

impl<'net> Walk<'net> {
    pub(crate) fn new(net: &'net NotificationNet, start: ItemId, options: WalkOptions) -> Self {
        // A tree reaches every item exactly once in either direction, so
        // the visited set is pure overhead there.
        let is_tree = net
            .graph_of(start)
            .map(|graph| graph.is_tree_raw())
            .unwrap_or(true);
        Self {
            net,
            stack: vec![start],
            visited: if is_tree { None } else { Some(HashSet::new()) },
            options,
            terminated: false,
        }
    }
}

impl<'net> Iterator for Walk<'net> {
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        if self.terminated {
            return None;
        }
        while let Some(item) = self.stack.pop() {
            if let Some(visited) = &mut self.visited {
                if !visited.insert(item) {
                    continue;
                }
            }
            if let Some(assertion) = &self.options.assertion {
                if !assertion(self.net, item) {
                    match self.options.on_failed {
                        OnFailedAssertion::Terminate => {
                            self.terminated = true;
                            return None;
                        }
                        OnFailedAssertion::SkipSubtree => continue,
                    }
                }
            }
            let neighbors = match self.options.direction {
                WalkDirection::Downstream => self.net.notifier_neighbors(item),
                WalkDirection::Upstream => self.net.subscriber_neighbors(item),
            };
            // Reversed so the smallest id is expanded first.
            self.stack.extend(neighbors.into_iter().rev());
            return Some(item);
        }
        None
    }
}
