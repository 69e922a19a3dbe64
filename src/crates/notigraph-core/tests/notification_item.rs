//! Topology-level tests: wiring, cycle rejection, merges, destruction.

use notigraph_core::{NotificationError, NotificationNet, WalkOptions};

#[test]
fn test_create_item() {
    let mut net = NotificationNet::new();
    let item = net.add_item();
    assert!(net.is_single(item).unwrap());
    assert!(net.graph_of(item).is_none());
    assert!(net.notifier_items(item).unwrap().is_empty());
    assert!(net.subscriber_items(item).unwrap().is_empty());
}

#[test]
fn test_detect_circle() {
    let mut net = NotificationNet::new();
    let item0 = net.add_item();
    let item1 = net.add_item();
    let item2 = net.add_item();

    net.subscribe(item0, item1).unwrap();
    net.subscribe(item1, item2).unwrap();

    let result = net.subscribe(item2, item0);
    assert!(matches!(
        result,
        Err(NotificationError::CircularSubscription { subscriber, notifier })
            if subscriber == item2 && notifier == item0
    ));

    // The failed call must not have touched edges or metadata.
    assert!(net.notifier_items(item2).unwrap().is_empty());
    assert!(net.subscriber_items(item0).unwrap().is_empty());
    let graph = net.graph_of(item0).expect("graph still intact");
    assert_eq!(graph.len().unwrap(), 3);
    assert!(graph.is_tree().unwrap());
    assert_eq!(graph.head().unwrap(), Some(item0));
}

#[test]
fn test_self_subscription_rejected() {
    let mut net = NotificationNet::new();
    let item = net.add_item();
    assert!(matches!(
        net.subscribe(item, item),
        Err(NotificationError::SelfSubscription(id)) if id == item
    ));
}

#[test]
fn test_merge_graphs() {
    let mut net = NotificationNet::new();
    let item0 = net.add_item();
    let item1 = net.add_item();
    let item2 = net.add_item();
    let item3 = net.add_item();

    net.subscribe(item0, item1).unwrap();
    net.subscribe(item2, item3).unwrap();
    net.subscribe(item1, item3).unwrap();

    let merged = net.graph_of(item0).expect("merged graph").id();
    assert_eq!(net.graph_of(item1).unwrap().id(), merged);
    assert_eq!(net.graph_of(item2).unwrap().id(), merged);
    assert_eq!(net.graph_of(item3).unwrap().id(), merged);
    assert_eq!(net.graph_of(item0).unwrap().len().unwrap(), 4);
}

#[test]
fn test_destroyed_graph_observation_fails() {
    let mut net = NotificationNet::new();
    let item0 = net.add_item();
    let item1 = net.add_item();
    let item2 = net.add_item();
    let item3 = net.add_item();

    net.subscribe(item0, item1).unwrap();
    net.subscribe(item2, item3).unwrap();

    let left = net.graph_of(item0).unwrap().id();
    let right = net.graph_of(item2).unwrap().id();

    net.subscribe(item1, item3).unwrap();

    let survivor = net.graph_of(item0).unwrap().id();
    let loser = if survivor == left { right } else { left };

    let tombstone = net.graph(loser).expect("tombstone is queryable");
    assert!(tombstone.is_destroyed());
    for result in [
        tombstone.len().err(),
        tombstone.is_tree().err(),
        tombstone.head().map(|_| 0usize).err(),
    ] {
        assert!(matches!(
            result,
            Some(NotificationError::GraphDestroyed(id)) if id == loser
        ));
    }
}

#[test]
fn test_unsubscribe_requires_edge() {
    let mut net = NotificationNet::new();
    let item0 = net.add_item();
    let item1 = net.add_item();

    assert!(matches!(
        net.unsubscribe(item0, item1),
        Err(NotificationError::NotANotifier { .. })
    ));

    net.subscribe(item0, item1).unwrap();
    net.unsubscribe(item0, item1).unwrap();
    assert!(net.notifier_items(item0).unwrap().is_empty());

    // Removing it twice fails the same way.
    assert!(matches!(
        net.unsubscribe(item0, item1),
        Err(NotificationError::NotANotifier { .. })
    ));
}

#[test]
fn test_has_subscription_direct_and_indirect() {
    let mut net = NotificationNet::new();
    let top = net.add_item();
    let mid = net.add_item();
    let leaf = net.add_item();

    net.subscribe(top, mid).unwrap();
    net.subscribe(mid, leaf).unwrap();

    assert!(net.has_subscription(top, mid, false).unwrap());
    assert!(!net.has_subscription(top, leaf, false).unwrap());
    assert!(net.has_subscription(top, leaf, true).unwrap());
    assert!(!net.has_subscription(leaf, top, true).unwrap());
    assert!(!net.has_subscription(top, top, true).unwrap());
}

#[test]
fn test_walk_through_directions() {
    let mut net = NotificationNet::new();
    let top = net.add_item();
    let mid = net.add_item();
    let leaf = net.add_item();

    net.subscribe(top, mid).unwrap();
    net.subscribe(mid, leaf).unwrap();

    let down: Vec<_> = net
        .walk_through(top, WalkOptions::downstream())
        .unwrap()
        .collect();
    assert_eq!(down, vec![top, mid, leaf]);

    let up: Vec<_> = net
        .walk_through(leaf, WalkOptions::upstream())
        .unwrap()
        .collect();
    assert_eq!(up, vec![leaf, mid, top]);
}

#[test]
fn test_merge_order_is_commutative_for_topology() {
    // a.subscribe(b) then c.subscribe(d) then bridge, in both orders.
    let build = |first_pair_first: bool| {
        let mut net = NotificationNet::new();
        let a = net.add_item();
        let b = net.add_item();
        let c = net.add_item();
        let d = net.add_item();
        if first_pair_first {
            net.subscribe(a, b).unwrap();
            net.subscribe(c, d).unwrap();
        } else {
            net.subscribe(c, d).unwrap();
            net.subscribe(a, b).unwrap();
        }
        net.subscribe(b, d).unwrap();
        let graph = net.graph_of(a).unwrap();
        (
            graph.len().unwrap(),
            graph.is_tree().unwrap(),
            graph.head().unwrap(),
        )
    };
    assert_eq!(build(true), build(false));
}
