//! Reads racing writes and reconfiguration

use crate::common::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_reads_see_one_chain_or_the_other() {
    let store = Arc::new(example_store());
    let notes: Vec<_> = (0..10)
        .map(|i| note(10 + i % 5, if i % 2 == 0 { "a" } else { "b" }, i))
        .collect();
    store.write_annotations(notes).unwrap();

    let only_a = vec![script("annotation.group == 'a'")];
    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(5));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut reads = 0;
                while !done.load(Ordering::Acquire) || reads < 100 {
                    let count = members(&store.read_annotations(&10, &14, 1).unwrap()).len();
                    assert!(count == 10 || count == 5, "torn read: {} members", count);
                    reads += 1;
                }
            })
        })
        .collect();

    barrier.wait();
    for i in 0..200 {
        if i % 2 == 0 {
            assert!(store.reconfigure(&only_a).is_empty());
        } else {
            assert!(store.reconfigure(&[]).is_empty());
        }
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn test_concurrent_writers_all_visible() {
    let store = Arc::new(pyramid_store(16));
    let handles: Vec<_> = (0..8u64)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50u64 {
                    store.write_annotation(note(t * 1000 + i, &format!("w{}", t), i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let bins = store.read_annotations(&0, &65_535, 0).unwrap();
    assert_eq!(members(&bins).len(), 400);
}

#[test]
fn test_recency_isolated_between_concurrent_reads() {
    let store = Arc::new(example_store());
    store
        .write_annotations((0..5).map(|i| note(10 + i, "g", i)).collect())
        .unwrap();
    store.reconfigure(&[FilterConfig::new("most_recent_by_group").with_property("count", 2)]);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    let kept: Vec<u64> = members(&store.read_annotations(&10, &14, 1).unwrap())
                        .iter()
                        .map(|a| a.timestamp())
                        .collect();
                    assert_eq!(kept, vec![3, 4]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
