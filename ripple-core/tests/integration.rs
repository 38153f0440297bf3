//! Integration Tests for the Changeset Pipeline
//!
//! These tests verify that dispatch, replay, lifecycle management, diffing
//! and patching work together: a mutation goes in on one side and a view
//! replaying the emitted changesets ends up with the same collection.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use ripple_core::collection::{Changeset, ObservableArray, ObservableExt, ObservableTree};
use ripple_core::config::{ReentrancyPolicy, SourceOptions};
use ripple_core::diff::{self, apply_diff, Edit, IndexPath, TreeArray, TreeNode};
use ripple_core::reactive::{Dispatcher, EventSource, ManagedSource};

/// Test that a view replaying every changeset stays equal to the collection.
#[test]
fn view_follows_observable_array() {
    let items = ObservableArray::new(vec!["a", "b", "c"]);

    let view = Arc::new(Mutex::new(Vec::new()));
    let view_clone = view.clone();
    let _subscription = items.subscribe(move |changeset: &Changeset<Vec<&'static str>>| {
        changeset.apply_to(&mut view_clone.lock());
    });

    // The first changeset is a reset
    assert_eq!(*view.lock(), vec!["a", "b", "c"]);

    items.push("d");
    items.remove(1);
    items.replace_with_diff(vec!["d", "a", "e"], |a, b| a == b);
    items.batch_update(|items| {
        items.insert(0, "z");
        items.move_element(0, 3);
        items.update(1, "y");
    });

    assert_eq!(*view.lock(), items.snapshot());
}

/// Test that a tree view stays in sync through diffed replacements.
#[test]
fn view_follows_observable_tree() {
    let sections = ObservableTree::new(TreeArray::new(vec![
        TreeNode::with_children("inbox", vec![TreeNode::new("mail 1"), TreeNode::new("mail 2")]),
        TreeNode::new("archive"),
    ]));

    let view = Arc::new(Mutex::new(TreeArray::default()));
    let view_clone = view.clone();
    let ops_seen = Arc::new(Mutex::new(Vec::new()));
    let ops_clone = ops_seen.clone();
    let _subscription = sections.subscribe(move |changeset: &Changeset<TreeArray<&'static str>>| {
        changeset.apply_to(&mut view_clone.lock());
        if let Some(diff) = changeset.diff() {
            ops_clone.lock().extend(diff.into_edits());
        }
    });

    sections.replace_with_diff(
        TreeArray::new(vec![
            TreeNode::with_children(
                "inbox",
                vec![TreeNode::new("mail 2"), TreeNode::new("mail 3")],
            ),
            TreeNode::new("archive"),
        ]),
        |a, b| a.value == b.value,
    );

    assert_eq!(*view.lock(), sections.snapshot());
    assert_eq!(
        *ops_seen.lock(),
        vec![
            Edit::Delete(IndexPath::from([0, 0])),
            Edit::Insert(IndexPath::from([0, 1])),
        ]
    );
}

/// Test that a late subscriber first receives the buffered values.
#[test]
fn late_subscriber_catches_up() {
    let source = EventSource::new(2);
    source.emit(1);
    source.emit(2);
    source.emit(3);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let _subscription = source.subscribe(move |value: &i32| seen_clone.lock().push(*value));
    assert_eq!(*seen.lock(), vec![2, 3]);

    source.emit(4);
    assert_eq!(*seen.lock(), vec![2, 3, 4]);
}

/// Test that a re-entrant dispatch is dropped, and queued when asked to.
#[test]
fn reentrant_dispatch_policies() {
    for (policy, expected) in [
        (ReentrancyPolicy::Drop, vec![1]),
        (ReentrancyPolicy::Queue, vec![1, 2]),
    ] {
        let dispatcher = Dispatcher::with_policy(policy);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = dispatcher.clone();
        let _emitter = dispatcher.subscribe(move |value: &i32| {
            if *value == 1 {
                inner.dispatch(2);
            }
        });
        let seen_clone = seen.clone();
        let _recorder = dispatcher.subscribe(move |value: &i32| seen_clone.lock().push(*value));

        dispatcher.dispatch(1);
        assert_eq!(*seen.lock(), expected, "policy {policy:?}");
    }
}

/// Test that a derived source is collectible once its last subscriber leaves.
#[test]
fn derived_source_lifecycle() {
    let upstream = EventSource::<i32>::new(0);
    let received = Arc::new(AtomicI32::new(0));

    let derived = upstream.map(|value| value + 100);
    let weak = derived.downgrade();

    let received_clone = received.clone();
    let subscription = derived.subscribe(move |value: &i32| {
        received_clone.store(*value, Ordering::SeqCst);
    });
    drop(derived);

    upstream.emit(1);
    assert_eq!(received.load(Ordering::SeqCst), 101);
    assert!(weak.is_alive());

    subscription.dispose();
    assert!(weak.upgrade().is_none());
    assert_eq!(upstream.subscriber_count(), 0);

    // Nothing left to deliver to
    upstream.emit(2);
    assert_eq!(received.load(Ordering::SeqCst), 101);
}

/// Test that a managed source built from options replays through a chain.
#[test]
fn managed_source_chain_with_replay() {
    let upstream = EventSource::<Vec<u32>>::new(1);
    upstream.emit(vec![1, 2]);

    let changes = upstream.diff_snapshots(|a: &u32, b: &u32| a == b);
    let labels = changes.map_elements(|value: u32| format!("row {value}"));

    let view = Arc::new(Mutex::new(Vec::new()));
    let view_clone = view.clone();
    let _subscription = labels.subscribe(move |changeset: &Changeset<Vec<String>>| {
        changeset.apply_to(&mut view_clone.lock());
    });
    assert_eq!(*view.lock(), vec!["row 1", "row 2"]);

    upstream.emit(vec![2, 3]);
    assert_eq!(*view.lock(), vec!["row 2", "row 3"]);

    let counter = ManagedSource::<u32>::with_options(SourceOptions::new().replay_length(3), |sink| {
        for value in 0..5 {
            sink.send(value);
        }
        None
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let _counter_subscription =
        counter.subscribe(move |value: &u32| seen_clone.lock().push(*value));
    assert_eq!(*seen.lock(), vec![2, 3, 4]);
}

/// Test the diff examples end to end, including the patch round trip.
#[test]
fn sequence_diff_round_trip() {
    let cases: Vec<(Vec<char>, Vec<char>)> = vec![
        (vec![], vec!['a', 'b']),
        (vec!['a', 'b'], vec![]),
        (vec!['a', 'b', 'c'], vec!['a', 'c', 'd']),
        (vec!['k', 'i', 't', 't', 'e', 'n'], vec!['s', 'i', 't', 't', 'i', 'n', 'g']),
    ];

    for (source, destination) in cases {
        let edits = diff::diff(&source, &destination);
        let mut patched = source.clone();
        apply_diff(&edits, &mut patched, &destination);
        assert_eq!(patched, destination, "edits {edits}");

        assert!(diff::diff(&destination, &destination).is_empty());
    }
}
