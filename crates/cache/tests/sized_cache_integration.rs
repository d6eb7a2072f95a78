//! Integration tests for `respool_cache::SizedResourceCache`.
//!
//! These tests drive the cache through its public surface only: scripted
//! over-commit scenarios, concurrent acquire/release from many threads, and
//! a randomized workload checked against a model of the size counters.

mod support;

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use respool_cache::{ResourceHandle, SizedResource, SizedResourceCache};
use respool_common::{capture_test_tracing, init_test_tracing, ByteSize};
use support::{LogCapture, TrackedResource, Tracker};

type Cache = SizedResourceCache<String, TrackedResource>;

/// Validates the 1 KiB over-commit walkthrough end to end.
///
/// Assertions:
/// - Confirms `r` is evicted and released while acquiring `r1k`.
/// - Confirms `r1k` is evicted while acquiring `r1M`.
/// - Confirms pinned `r1M` over-commits by 1 MiB minus the 1 KiB limit.
/// - Confirms releasing `r1M` evicts it and drains the cache.
/// - Confirms every release hook ran exactly once.
#[test]
fn overcommit_walkthrough_with_one_kib_limit() {
    init_test_tracing();
    let tracker = Tracker::new();
    let cache = Cache::with_name("walkthrough", ByteSize::KIBIBYTE);

    let r = cache.acquire("r".to_string(), tracker.factory(1)).unwrap();
    cache.release(r);
    assert_eq!(cache.total_size(), ByteSize::from_bytes(1));
    assert_eq!(cache.evictable_size(), ByteSize::from_bytes(1));

    let r1k = cache.acquire("r1k".to_string(), tracker.factory(1024)).unwrap();
    assert_eq!(tracker.released(), 1);
    assert!(!cache.contains(&"r".to_string()));
    cache.release(r1k);
    assert_eq!(cache.total_size(), ByteSize::from_bytes(1024));
    assert_eq!(cache.evictable_size(), ByteSize::from_bytes(1024));

    let r1m = cache.acquire("r1M".to_string(), tracker.factory(1024 * 1024)).unwrap();
    assert!(!cache.contains(&"r1k".to_string()));
    assert_eq!(tracker.released(), 2);
    assert_eq!(cache.total_size(), ByteSize::from_bytes(1_048_576));
    assert_eq!(cache.evictable_size(), ByteSize::ZERO);
    assert_eq!(cache.overcommitted_size(), ByteSize::from_bytes(1_047_552));
    assert!(cache.stats().is_overcommitted());
    assert!(!r1m.is_released());

    cache.release(r1m);
    assert_eq!(cache.total_size(), ByteSize::ZERO);
    assert_eq!(cache.overcommitted_size(), ByteSize::ZERO);
    assert_eq!(cache.entry_count(), 0);
    assert_eq!(tracker.created(), 3);
    assert_eq!(tracker.released(), 3);
}

/// Validates that a pinned entry survives any amount of pressure.
///
/// Assertions:
/// - Ensures the pinned value is never released while its handle lives.
/// - Confirms it is evicted once released under pressure.
#[test]
fn pinned_entries_survive_pressure() {
    let tracker = Tracker::new();
    let cache = Cache::new(ByteSize::from_bytes(100));

    let pinned = cache.acquire("pinned".to_string(), tracker.factory(80)).unwrap();
    for i in 0..20 {
        let handle = cache.acquire(format!("churn-{i}"), tracker.factory(40)).unwrap();
        cache.release(handle);
        assert!(!pinned.is_released());
        assert!(cache.contains(&"pinned".to_string()));
    }

    assert_eq!(pinned.key(), "pinned");
    cache.release(pinned);
    let _pressure = cache.acquire("big".to_string(), tracker.factory(100)).unwrap();
    assert!(!cache.contains(&"pinned".to_string()));
    assert_eq!(tracker.live(), 1);
}

/// Validates single-flight creation when many threads miss the same key.
///
/// Assertions:
/// - Confirms the factory ran exactly once across all threads.
/// - Confirms every thread observed the same value.
/// - Confirms the entry becomes evictable once all handles are released.
#[test]
fn concurrent_misses_create_once() {
    const THREADS: usize = 16;

    let tracker = Tracker::new();
    let cache = Cache::new(ByteSize::MEBIBYTE);
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = cache.clone();
            let tracker = Arc::clone(&tracker);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let handle = cache.acquire("shared".to_string(), tracker.factory(64)).unwrap();
                let address = handle.value() as *const TrackedResource as usize;
                barrier.wait();
                cache.release(handle);
                address
            })
        })
        .collect();

    let addresses: Vec<usize> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    assert_eq!(tracker.created(), 1);
    assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(cache.entry_count(), 1);
    assert_eq!(cache.evictable_size(), ByteSize::from_bytes(64));
}

/// Validates counters under concurrent churn across many keys.
///
/// Assertions:
/// - Confirms the cache settles within its limit once all handles are back.
/// - Confirms `total_size == evictable_size` when nothing is pinned.
/// - Confirms every released resource was released exactly once and the
///   remaining entries account for the live ones.
#[test]
fn concurrent_churn_keeps_counters_consistent() {
    init_test_tracing();
    const THREADS: u64 = 8;
    const ROUNDS: u64 = 500;

    let tracker = Tracker::new();
    let cache = Cache::with_name("churn", ByteSize::from_kib(4));

    let workers: Vec<_> = (0..THREADS)
        .map(|seed| {
            let cache = cache.clone();
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut held: Vec<ResourceHandle<String, TrackedResource>> = Vec::new();
                for _ in 0..ROUNDS {
                    let key = format!("key-{}", rng.gen_range(0..32));
                    let size = 64 + (key.len() as u64) * 16;
                    held.push(cache.acquire(key, tracker.factory(size)).unwrap());
                    if held.len() > 3 || rng.gen_bool(0.5) {
                        let at = rng.gen_range(0..held.len());
                        cache.release(held.swap_remove(at));
                    }
                }
                // Remaining handles release on drop.
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.pinned_count, 0);
    assert_eq!(stats.total_size, stats.evictable_size);
    assert!(stats.total_size <= stats.size_limit);
    assert_eq!(stats.entry_count, tracker.live());
}

/// Validates the size counters against a model over a random workload.
///
/// Assertions:
/// - Confirms `total_size` is the sum over mapped entries after every step.
/// - Confirms `evictable_size` is the sum over unreferenced entries.
/// - Confirms `overcommitted_size` is `max(0, total - limit)`.
/// - Ensures over-commit only happens when nothing is left to evict.
#[test]
fn randomized_workload_matches_model() {
    let mut rng = StdRng::seed_from_u64(0x0dd_ba11);
    let tracker = Tracker::new();
    let limit = ByteSize::from_bytes(2_000);
    let cache = Cache::new(limit);

    let sizes: Vec<u64> = (0..24).map(|_| rng.gen_range(1..600)).collect();
    let mut held: Vec<ResourceHandle<String, TrackedResource>> = Vec::new();

    for _ in 0..5_000 {
        if held.is_empty() || rng.gen_bool(0.55) {
            let index = rng.gen_range(0..sizes.len());
            let handle =
                cache.acquire(format!("k{index}"), tracker.factory(sizes[index])).unwrap();
            held.push(handle);
        } else {
            let at = rng.gen_range(0..held.len());
            cache.release(held.swap_remove(at));
        }

        let mut pinned: HashMap<&str, u64> = HashMap::new();
        for handle in &held {
            pinned.insert(handle.key().as_str(), handle.value().size().as_bytes());
        }
        let pinned_total: u64 = pinned.values().sum();

        let stats = cache.stats();
        assert_eq!(stats.pinned_count, pinned.len());
        assert_eq!(
            stats.total_size.as_bytes(),
            pinned_total + stats.evictable_size.as_bytes(),
        );
        assert_eq!(stats.overcommitted_size(), stats.total_size.saturating_sub(limit));
        if stats.is_overcommitted() {
            assert_eq!(stats.evictable_size, ByteSize::ZERO);
        }
        assert_eq!(stats.entry_count, tracker.live());
    }
}

/// Validates the tracing events emitted by acquire, release and eviction.
///
/// Assertions:
/// - Confirms creation and eviction events carry the cache name.
/// - Confirms an over-commit produces a warning.
#[test]
fn lifecycle_events_are_logged() {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let guard = capture_test_tracing(move || writer.clone());

    let tracker = Tracker::new();
    let cache = Cache::with_name("logged", ByteSize::from_bytes(10));
    let first = cache.acquire("first".to_string(), tracker.factory(8)).unwrap();
    cache.release(first);
    let second = cache.acquire("second".to_string(), tracker.factory(20)).unwrap();
    cache.release(second);
    drop(guard);

    let logs = capture.contents();
    assert!(logs.contains("created resource"), "{logs}");
    assert!(logs.contains("evicted resource"), "{logs}");
    assert!(logs.contains("pinned resources exceed the size limit"), "{logs}");
    assert!(logs.contains("cache=logged"), "{logs}");
}
