//! Small helpers shared across the engine.

use serde_json::Value;

use crate::graph::GraphId;

/// Shape of a subscription, classified by whether each endpoint already
/// belongs to a graph.
///
/// The subscription transaction uses this to decide how behavior
/// registries combine and which component survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GraphCondition {
    /// Neither endpoint has a graph yet.
    BothSingle,
    /// Only the notifier has a graph; the subscriber joins it.
    SubscriberSingle,
    /// Only the subscriber has a graph; the notifier joins it.
    NotifierSingle,
    /// Both endpoints have graphs (possibly the same one).
    BothGraph,
}

impl GraphCondition {
    pub(crate) fn classify(subscriber: Option<GraphId>, notifier: Option<GraphId>) -> Self {
        match (subscriber, notifier) {
            (None, None) => Self::BothSingle,
            (None, Some(_)) => Self::SubscriberSingle,
            (Some(_), None) => Self::NotifierSingle,
            (Some(_), Some(_)) => Self::BothGraph,
        }
    }
}

/// Truthiness of a JSON value: `null`, `false`, `0`, `0.0`, `""`, `[]`
/// and `{}` are falsey, everything else is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
