//! YAML scenario format: declare types, items and subscriptions, apply
//! attribute writes, and optionally assert the resulting state.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use notigraph_core::{
    CountAttribute, ItemId, NotificationNet, NotificationType, NotifySubscribers,
};

/// A replayable scenario file.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub title: Option<String>,
    /// type name → type declaration
    pub types: BTreeMap<String, TypeSpec>,
    /// item name → names of types attached to it
    pub items: BTreeMap<String, Vec<String>>,
    /// (subscriber, notifier) pairs, applied in order
    #[serde(default)]
    pub subscriptions: Vec<(String, String)>,
    /// attribute writes, applied in order after wiring
    #[serde(default)]
    pub sets: Vec<SetStep>,
    /// assertions checked by `notigraph check`
    #[serde(default)]
    pub expect: Vec<Expectation>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "behavior", rename_all = "snake_case")]
pub enum TypeSpec {
    /// Boolean-OR red point.
    Notify {
        /// Type identifier; defaults to the map key.
        #[serde(default)]
        identifier: Option<String>,
        /// Propagated attribute name.
        #[serde(default = "default_attribute")]
        attribute: String,
        /// Default attribute values seeded on attach.
        #[serde(default)]
        defaults: BTreeMap<String, Value>,
    },
    /// Additive counter.
    Count {
        #[serde(default)]
        identifier: Option<String>,
        /// counted source attribute → storage attribute
        counts: BTreeMap<String, String>,
    },
}

fn default_attribute() -> String {
    "activate".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SetStep {
    pub item: String,
    /// type identifier the write goes through
    pub notification: String,
    pub attribute: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct Expectation {
    pub item: String,
    pub notification: String,
    pub attribute: String,
    pub value: Value,
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("item '{0}' is not declared under items")]
    UnknownItem(String),

    #[error("type '{0}' is not declared under types")]
    UnknownType(String),

    #[error("expected {item}.{notification}.{attribute} = {expected}, got {actual}")]
    ExpectationFailed {
        item: String,
        notification: String,
        attribute: String,
        expected: Value,
        actual: Value,
    },

    #[error(transparent)]
    Notification(#[from] notigraph_core::NotificationError),
}

/// A scenario instantiated against a live net.
pub struct ScenarioRun {
    pub net: NotificationNet,
    /// item name → id
    pub item_ids: BTreeMap<String, ItemId>,
    /// (identifier, readable attribute) probes per item name
    pub probes: BTreeMap<String, Vec<(String, String)>>,
}

impl Scenario {
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Build the net, wire subscriptions, and apply every `sets` step.
    pub fn run(&self) -> Result<ScenarioRun, ScenarioError> {
        let mut net = NotificationNet::new();

        let mut types: HashMap<&str, NotificationType> = HashMap::new();
        let mut readable: HashMap<&str, Vec<(String, String)>> = HashMap::new();
        for (name, spec) in &self.types {
            let (ty, probes) = build_type(name, spec);
            types.insert(name.as_str(), ty);
            readable.insert(name.as_str(), probes);
        }

        let mut item_ids = BTreeMap::new();
        let mut probes: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        for (name, attached) in &self.items {
            let item = net.add_item();
            item_ids.insert(name.clone(), item);
            let item_probes = probes.entry(name.clone()).or_default();
            for type_name in attached {
                let ty = types
                    .get(type_name.as_str())
                    .ok_or_else(|| ScenarioError::UnknownType(type_name.clone()))?;
                net.add_notification(item, ty)?;
                item_probes.extend(
                    readable
                        .get(type_name.as_str())
                        .into_iter()
                        .flatten()
                        .cloned(),
                );
            }
        }

        let resolve = |name: &str, ids: &BTreeMap<String, ItemId>| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ScenarioError::UnknownItem(name.to_string()))
        };

        for (subscriber, notifier) in &self.subscriptions {
            let subscriber = resolve(subscriber, &item_ids)?;
            let notifier = resolve(notifier, &item_ids)?;
            net.subscribe(subscriber, notifier)?;
        }

        for step in &self.sets {
            let item = resolve(&step.item, &item_ids)?;
            info!(item = %step.item, notification = %step.notification,
                attribute = %step.attribute, "applying write");
            net.set_attribute(item, &step.notification, &step.attribute, step.value.clone())?;
        }

        Ok(ScenarioRun {
            net,
            item_ids,
            probes,
        })
    }
}

impl ScenarioRun {
    /// Check every expectation, failing on the first mismatch.
    pub fn check(&self, expectations: &[Expectation]) -> Result<(), ScenarioError> {
        for expectation in expectations {
            let item = self
                .item_ids
                .get(&expectation.item)
                .copied()
                .ok_or_else(|| ScenarioError::UnknownItem(expectation.item.clone()))?;
            let actual =
                self.net
                    .get_attribute(item, &expectation.notification, &expectation.attribute)?;
            if actual != expectation.value {
                return Err(ScenarioError::ExpectationFailed {
                    item: expectation.item.clone(),
                    notification: expectation.notification.clone(),
                    attribute: expectation.attribute.clone(),
                    expected: expectation.value.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Gathered values of every readable attribute, per item.
    pub fn state_table(&self) -> Result<Vec<(String, String, String, Value)>, ScenarioError> {
        let mut rows = Vec::new();
        for (name, item) in &self.item_ids {
            if let Some(probes) = self.probes.get(name) {
                for (identifier, attribute) in probes {
                    let value = self.net.get_attribute(*item, identifier, attribute)?;
                    rows.push((name.clone(), identifier.clone(), attribute.clone(), value));
                }
            }
        }
        Ok(rows)
    }
}

fn build_type(name: &str, spec: &TypeSpec) -> (NotificationType, Vec<(String, String)>) {
    match spec {
        TypeSpec::Notify {
            identifier,
            attribute,
            defaults,
        } => {
            let identifier = identifier.clone().unwrap_or_else(|| name.to_string());
            let mut ty = NotificationType::new(
                identifier.clone(),
                Rc::new(NotifySubscribers::new(attribute.clone())),
            );
            for (default_name, value) in defaults {
                ty = ty.with_default(default_name.clone(), value.clone());
            }
            (ty, vec![(identifier, attribute.clone())])
        }
        TypeSpec::Count { identifier, counts } => {
            let identifier = identifier.clone().unwrap_or_else(|| name.to_string());
            let mut behavior = CountAttribute::new();
            let mut probes = Vec::new();
            for (source, storage) in counts {
                behavior = behavior.count(source.clone(), storage.clone());
                probes.push((identifier.clone(), storage.clone()));
            }
            (
                NotificationType::new(identifier, Rc::new(behavior)),
                probes,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCENARIO: &str = r#"
title: mailbox badges
types:
  red_point:
    behavior: notify
  red_counter:
    behavior: count
    identifier: red_point
    counts:
      activate: count_activate
items:
  overview: [red_counter]
  inbox: [red_point]
  mail_a: [red_point]
  mail_b: [red_point]
subscriptions:
  - [inbox, mail_a]
  - [inbox, mail_b]
  - [overview, mail_a]
  - [overview, mail_b]
sets:
  - { item: mail_a, notification: red_point, attribute: activate, value: true }
  - { item: mail_b, notification: red_point, attribute: activate, value: true }
  - { item: mail_b, notification: red_point, attribute: activate, value: false }
expect:
  - { item: inbox, notification: red_point, attribute: activate, value: true }
  - { item: overview, notification: red_point, attribute: count_activate, value: 1 }
"#;

    #[test]
    fn test_scenario_round_trip() {
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();
        let run = scenario.run().unwrap();
        run.check(&scenario.expect).unwrap();

        let rows = run.state_table().unwrap();
        assert!(rows
            .iter()
            .any(|(item, _, attribute, value)| item == "inbox"
                && attribute == "activate"
                && *value == json!(true)));
    }

    #[test]
    fn test_unknown_item_is_reported() {
        let broken = SCENARIO.replace("item: mail_a", "item: mail_z");
        let scenario = Scenario::from_yaml(&broken).unwrap();
        assert!(matches!(
            scenario.run(),
            Err(ScenarioError::UnknownItem(name)) if name == "mail_z"
        ));
    }

    #[test]
    fn test_failed_expectation_is_reported() {
        let scenario = Scenario::from_yaml(SCENARIO).unwrap();
        let run = scenario.run().unwrap();
        let bad = vec![Expectation {
            item: "inbox".to_string(),
            notification: "red_point".to_string(),
            attribute: "activate".to_string(),
            value: json!(false),
        }];
        assert!(matches!(
            run.check(&bad),
            Err(ScenarioError::ExpectationFailed { .. })
        ));
    }
}
