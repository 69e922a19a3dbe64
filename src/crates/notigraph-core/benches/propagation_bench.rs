use criterion::{black_box, criterion_group, criterion_main, Criterion};
use notigraph_core::{ItemId, NotificationNet, NotificationType, NotifySubscribers};
use serde_json::json;
use std::rc::Rc;

fn chain_net(length: usize) -> (NotificationNet, Vec<ItemId>) {
    let ty = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()));
    let mut net = NotificationNet::new();
    let items: Vec<ItemId> = (0..length)
        .map(|_| {
            let item = net.add_item();
            net.add_notification(item, &ty).unwrap();
            item
        })
        .collect();
    for pair in items.windows(2) {
        net.subscribe(pair[0], pair[1]).unwrap();
    }
    (net, items)
}

fn chain_toggle_benchmark(c: &mut Criterion) {
    c.bench_function("chain 100 toggle", |b| {
        let (mut net, items) = chain_net(100);
        let leaf = items[items.len() - 1];
        b.iter(|| {
            net.set_attribute(black_box(leaf), "red_point", "activate", json!(true))
                .unwrap();
            net.set_attribute(black_box(leaf), "red_point", "activate", json!(false))
                .unwrap();
        });
    });
}

fn fanin_toggle_benchmark(c: &mut Criterion) {
    c.bench_function("fan-in 200 toggle", |b| {
        let ty = NotificationType::new("red_point", Rc::new(NotifySubscribers::default()));
        let mut net = NotificationNet::new();
        let root = net.add_item();
        net.add_notification(root, &ty).unwrap();
        let leaves: Vec<ItemId> = (0..200)
            .map(|_| {
                let leaf = net.add_item();
                net.add_notification(leaf, &ty).unwrap();
                net.subscribe(root, leaf).unwrap();
                leaf
            })
            .collect();
        b.iter(|| {
            net.set_attribute(black_box(leaves[0]), "red_point", "activate", json!(true))
                .unwrap();
            net.set_attribute(black_box(leaves[0]), "red_point", "activate", json!(false))
                .unwrap();
        });
    });
}

fn merge_benchmark(c: &mut Criterion) {
    c.bench_function("merge two chains of 50", |b| {
        b.iter(|| {
            let (mut net, left) = chain_net(50);
            let right: Vec<ItemId> = (0..50).map(|_| net.add_item()).collect();
            for pair in right.windows(2) {
                net.subscribe(pair[0], pair[1]).unwrap();
            }
            net.subscribe(black_box(left[49]), black_box(right[0])).unwrap();
        });
    });
}

criterion_group!(
    benches,
    chain_toggle_benchmark,
    fanin_toggle_benchmark,
    merge_benchmark
);
criterion_main!(benches);
