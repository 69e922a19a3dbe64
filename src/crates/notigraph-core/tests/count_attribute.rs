//! Counter aggregation: observed flags, direct storage writes, diamonds.

use std::rc::Rc;

use notigraph_core::{
    CountAttribute, ItemId, NotificationNet, NotificationType, NotifySubscribers,
};
use serde_json::json;

const ACTIVATE: &str = "activate";
const COUNT: &str = "count_activate";

fn red_point() -> NotificationType {
    NotificationType::new("red_point", Rc::new(NotifySubscribers::new(ACTIVATE)))
}

fn red_counter() -> NotificationType {
    NotificationType::new(
        "red_point",
        Rc::new(CountAttribute::new().count(ACTIVATE, COUNT)),
    )
}

fn get_count(net: &NotificationNet, counter: ItemId) -> i64 {
    net.get_attribute(counter, "red_point", COUNT)
        .unwrap()
        .as_i64()
        .unwrap()
}

fn set_red_point(net: &mut NotificationNet, item: ItemId, activate: bool) {
    net.set_attribute(item, "red_point", ACTIVATE, json!(activate))
        .unwrap();
}

#[test]
fn test_simple_count() {
    let mut net = NotificationNet::new();
    let counter = net.add_item();
    net.add_notification(counter, &red_counter()).unwrap();
    let red = red_point();
    let r0 = net.add_item();
    let r1 = net.add_item();
    net.add_notification(r0, &red).unwrap();
    net.add_notification(r1, &red).unwrap();

    net.subscribe(counter, r0).unwrap();
    net.subscribe(counter, r1).unwrap();

    assert_eq!(get_count(&net, counter), 0);
    set_red_point(&mut net, r0, true);
    assert_eq!(get_count(&net, counter), 1);
    set_red_point(&mut net, r1, true);
    assert_eq!(get_count(&net, counter), 2);
    set_red_point(&mut net, r0, false);
    assert_eq!(get_count(&net, counter), 1);
    set_red_point(&mut net, r1, false);
    assert_eq!(get_count(&net, counter), 0);
}

#[test]
fn test_count_through_intermediate_items() {
    let mut net = NotificationNet::new();
    let counter = net.add_item();
    net.add_notification(counter, &red_counter()).unwrap();
    let red = red_point();
    let mid = net.add_item();
    let r0 = net.add_item();
    let r1 = net.add_item();
    net.add_notification(r0, &red).unwrap();
    net.add_notification(r1, &red).unwrap();

    net.subscribe(counter, mid).unwrap();
    net.subscribe(mid, r0).unwrap();
    net.subscribe(mid, r1).unwrap();

    set_red_point(&mut net, r0, true);
    set_red_point(&mut net, r1, true);
    assert_eq!(get_count(&net, counter), 2);

    set_red_point(&mut net, r0, false);
    assert_eq!(get_count(&net, counter), 1);
}

#[test]
fn test_diamond_counts_once() {
    let mut net = NotificationNet::new();
    let counter = net.add_item();
    net.add_notification(counter, &red_counter()).unwrap();
    let red = red_point();
    let left = net.add_item();
    let right = net.add_item();
    let leaf = net.add_item();
    net.add_notification(leaf, &red).unwrap();

    net.subscribe(counter, left).unwrap();
    net.subscribe(counter, right).unwrap();
    net.subscribe(left, leaf).unwrap();
    net.subscribe(right, leaf).unwrap();

    set_red_point(&mut net, leaf, true);
    assert_eq!(get_count(&net, counter), 1);
    set_red_point(&mut net, leaf, false);
    assert_eq!(get_count(&net, counter), 0);
}

#[test]
fn test_direct_storage_write_propagates_delta() {
    let mut net = NotificationNet::new();
    let upper = net.add_item();
    let lower = net.add_item();
    net.add_notification(upper, &red_counter()).unwrap();
    net.add_notification(lower, &red_counter()).unwrap();

    net.subscribe(upper, lower).unwrap();

    net.set_attribute(lower, "red_point", COUNT, json!(5)).unwrap();
    assert_eq!(get_count(&net, lower), 5);
    assert_eq!(get_count(&net, upper), 5);

    net.set_attribute(lower, "red_point", COUNT, json!(2)).unwrap();
    assert_eq!(get_count(&net, lower), 2);
    assert_eq!(get_count(&net, upper), 2);
}

#[test]
fn test_custom_count_function() {
    let mut net = NotificationNet::new();
    let counter = net.add_item();
    let weighted = NotificationType::new(
        "red_point",
        Rc::new(CountAttribute::new().count_with(ACTIVATE, "weight", |value| {
            if value.as_bool().unwrap_or(false) {
                10
            } else {
                0
            }
        })),
    );
    net.add_notification(counter, &weighted).unwrap();
    let red = red_point();
    let r0 = net.add_item();
    net.add_notification(r0, &red).unwrap();

    net.subscribe(counter, r0).unwrap();

    set_red_point(&mut net, r0, true);
    assert_eq!(
        net.get_attribute(counter, "red_point", "weight")
            .unwrap(),
        json!(10)
    );
    set_red_point(&mut net, r0, false);
    assert_eq!(
        net.get_attribute(counter, "red_point", "weight")
            .unwrap(),
        json!(0)
    );
}

#[test]
fn test_counter_and_badge_observe_the_same_write() {
    // A plain badge parent and a counter both aggregate the same leaf;
    // one write feeds both interest dispatch and owner propagation.
    let mut net = NotificationNet::new();
    let red = red_point();
    let parent = net.add_item();
    let leaf = net.add_item();
    net.add_notification(parent, &red).unwrap();
    net.add_notification(leaf, &red).unwrap();
    let counter = net.add_item();
    net.add_notification(counter, &red_counter()).unwrap();

    net.subscribe(parent, leaf).unwrap();
    net.subscribe(counter, leaf).unwrap();

    set_red_point(&mut net, leaf, true);
    assert_eq!(
        net.get_attribute(parent, "red_point", ACTIVATE).unwrap(),
        json!(true)
    );
    assert_eq!(get_count(&net, counter), 1);

    set_red_point(&mut net, leaf, false);
    assert_eq!(
        net.get_attribute(parent, "red_point", ACTIVATE).unwrap(),
        json!(false)
    );
    assert_eq!(get_count(&net, counter), 0);
}

#[test]
fn test_toggling_twice_is_stable() {
    let mut net = NotificationNet::new();
    let counter = net.add_item();
    net.add_notification(counter, &red_counter()).unwrap();
    let red = red_point();
    let r0 = net.add_item();
    net.add_notification(r0, &red).unwrap();
    net.subscribe(counter, r0).unwrap();

    set_red_point(&mut net, r0, true);
    set_red_point(&mut net, r0, true);
    assert_eq!(get_count(&net, counter), 1);
    set_red_point(&mut net, r0, false);
    set_red_point(&mut net, r0, false);
    assert_eq!(get_count(&net, counter), 0);
}
