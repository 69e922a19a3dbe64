//! Debug rendering of a net as Mermaid or DOT text.
//!
//! Arrows follow the direction of propagation: `notifier --> subscriber`.
//! Items whose attribute state gathers anything truthy are highlighted,
//! which makes red-point chains visible at a glance in a rendered
//! diagram.
//!
//! This is a debugging aid; nothing here is a stable format.
//!
//! # Examples
//!
//! ```rust
//! use notigraph_core::{visualize, NotificationNet, VisualizationOptions};
//!
//! let mut net = NotificationNet::new();
//! let parent = net.add_item();
//! let child = net.add_item();
//! net.subscribe(parent, child)?;
//!
//! let mermaid = visualize(&net, &VisualizationOptions::mermaid().with_title("badges"));
//! assert!(mermaid.starts_with("graph TD"));
//! assert!(mermaid.contains("-->"));
//!
//! let dot = visualize(&net, &VisualizationOptions::dot());
//! assert!(dot.starts_with("digraph"));
//! # Ok::<(), notigraph_core::NotificationError>(())
//! ```

use std::fmt::Write as _;

use crate::item::ItemId;
use crate::net::NotificationNet;
use crate::util::truthy;

/// Output format for [`visualize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationFormat {
    /// DOT format for Graphviz
    Dot,
    /// Mermaid diagram format
    Mermaid,
}

/// Rendering options for [`visualize`].
#[derive(Debug, Clone)]
pub struct VisualizationOptions {
    /// Output format
    pub format: VisualizationFormat,
    /// Include per-item attribute state in node labels
    pub include_attributes: bool,
    /// Diagram title
    pub title: Option<String>,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            format: VisualizationFormat::Mermaid,
            include_attributes: false,
            title: None,
        }
    }
}

impl VisualizationOptions {
    /// Create with Mermaid format.
    pub fn mermaid() -> Self {
        Self {
            format: VisualizationFormat::Mermaid,
            ..Default::default()
        }
    }

    /// Create with DOT format.
    pub fn dot() -> Self {
        Self {
            format: VisualizationFormat::Dot,
            ..Default::default()
        }
    }

    /// Set the diagram title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Put attribute state into node labels.
    pub fn with_attributes(mut self) -> Self {
        self.include_attributes = true;
        self
    }
}

/// Render the whole net in the requested format.
pub fn visualize(net: &NotificationNet, options: &VisualizationOptions) -> String {
    match options.format {
        VisualizationFormat::Mermaid => visualize_mermaid(net, options),
        VisualizationFormat::Dot => visualize_dot(net, options),
    }
}

fn sorted_items(net: &NotificationNet) -> Vec<ItemId> {
    let mut items: Vec<ItemId> = net.items().collect();
    items.sort();
    items
}

fn item_label(net: &NotificationNet, item: ItemId, include_attributes: bool) -> String {
    let mut label = item.to_string();
    if include_attributes {
        let mut identifiers: Vec<String> = net
            .notification_identifiers(item)
            .into_iter()
            .collect();
        identifiers.sort();
        for identifier in identifiers {
            if let Some(set) = net.attribute_set(item, &identifier) {
                let mut entries: Vec<String> = set
                    .iter_owned()
                    .map(|(name, value)| format!("{name}={value}"))
                    .chain(
                        set.iter_inherited()
                            .map(|(name, value)| format!("~{name}={value}")),
                    )
                    .collect();
                entries.sort();
                if !entries.is_empty() {
                    let _ = write!(label, "\\n{}: {}", identifier, entries.join(" "));
                }
            }
        }
    }
    label
}

/// An item lights up when anything in its attribute state gathers truthy.
fn is_lit(net: &NotificationNet, item: ItemId) -> bool {
    net.notification_identifiers(item).iter().any(|identifier| {
        net.attribute_set(item, identifier)
            .map(|set| {
                set.iter_owned().any(|(_, value)| truthy(value))
                    || set.iter_inherited().any(|(_, value)| truthy(value))
            })
            .unwrap_or(false)
    })
}

fn visualize_mermaid(net: &NotificationNet, options: &VisualizationOptions) -> String {
    let mut output = String::new();
    output.push_str("graph TD\n");

    if let Some(title) = &options.title {
        let _ = writeln!(output, "    %% {}", title);
    }

    for item in sorted_items(net) {
        let label = item_label(net, item, options.include_attributes);
        let _ = writeln!(
            output,
            "    {}[\"{}\"]",
            sanitize_id(item),
            escape_label(&label)
        );
        if is_lit(net, item) {
            let _ = writeln!(
                output,
                "    style {} fill:#FFB6C1,stroke:#DC143C,stroke-width:2px",
                sanitize_id(item)
            );
        }
    }

    for subscriber in sorted_items(net) {
        for notifier in net.notifier_neighbors(subscriber) {
            let _ = writeln!(
                output,
                "    {} --> {}",
                sanitize_id(notifier),
                sanitize_id(subscriber)
            );
        }
    }

    output
}

fn visualize_dot(net: &NotificationNet, options: &VisualizationOptions) -> String {
    let mut output = String::new();
    output.push_str("digraph notifications {\n");
    output.push_str("    rankdir=TD;\n");
    output.push_str("    node [shape=box, style=rounded];\n");

    if let Some(title) = &options.title {
        let _ = writeln!(output, "    label=\"{}\";", escape_label(title));
    }

    for item in sorted_items(net) {
        let label = item_label(net, item, options.include_attributes);
        let style = if is_lit(net, item) {
            ", style=filled, fillcolor=lightpink"
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "    {} [label=\"{}\"{}];",
            sanitize_id(item),
            escape_label(&label),
            style
        );
    }

    for subscriber in sorted_items(net) {
        for notifier in net.notifier_neighbors(subscriber) {
            let _ = writeln!(
                output,
                "    {} -> {};",
                sanitize_id(notifier),
                sanitize_id(subscriber)
            );
        }
    }

    output.push_str("}\n");
    output
}

fn sanitize_id(item: ItemId) -> String {
    format!("i{}", item.index())
}

fn escape_label(label: &str) -> String {
    label.replace('"', "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NotificationNet, NotificationType, NotifySubscribers};
    use serde_json::json;
    use std::rc::Rc;

    fn lit_pair() -> (NotificationNet, ItemId, ItemId) {
        let ty = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()));
        let mut net = NotificationNet::new();
        let parent = net.add_item();
        let child = net.add_item();
        net.add_notification(parent, &ty).unwrap();
        net.add_notification(child, &ty).unwrap();
        net.subscribe(parent, child).unwrap();
        net.notification(child, "red_point")
            .unwrap()
            .set_attribute("activate", json!(true))
            .unwrap();
        (net, parent, child)
    }

    #[test]
    fn test_mermaid_edges_follow_propagation() {
        let (net, parent, child) = lit_pair();
        let rendered = visualize(&net, &VisualizationOptions::mermaid());
        let edge = format!("i{} --> i{}", child.index(), parent.index());
        assert!(rendered.contains(&edge), "missing edge in:\n{rendered}");
    }

    #[test]
    fn test_mermaid_styles_activated_items() {
        let (net, parent, child) = lit_pair();
        let rendered = visualize(&net, &VisualizationOptions::mermaid());
        assert!(rendered.contains(&format!("style i{}", child.index())));
        assert!(rendered.contains(&format!("style i{}", parent.index())));
    }

    #[test]
    fn test_dot_contains_nodes_and_title() {
        let (net, _, _) = lit_pair();
        let rendered = visualize(&net, &VisualizationOptions::dot().with_title("badge state"));
        assert!(rendered.starts_with("digraph"));
        assert!(rendered.contains("label=\"badge state\""));
        assert!(rendered.contains("->"));
    }

    #[test]
    fn test_attribute_labels() {
        let (net, _, child) = lit_pair();
        let rendered = visualize(
            &net,
            &VisualizationOptions::mermaid().with_attributes(),
        );
        assert!(rendered.contains("red_point"));
        assert!(rendered.contains("activate=true"));
        let _ = child;
    }
}
