use std::collections::HashSet;
use std::time::Duration;

use entrystore::cache::{CacheConfig, EntryCache};
use entrystore::domain::entities::Entry;
use entrystore::infra::telemetry;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

fn saved_entry(title: &str) -> Entry {
    let mut entry = Entry::new();
    entry.set_title(title);
    entry.set_body("Metrics test body");
    entry.ensure_id();
    entry
}

#[test]
fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    // hit, miss and eviction on a single-slot cache
    let small = EntryCache::new(&CacheConfig {
        capacity: 1,
        ..Default::default()
    });
    let first = saved_entry("First Metrics Entry");
    let second = saved_entry("Second Metrics Entry");
    let first_id = first.id().expect("id assigned");

    assert!(small.get_by_id("metrics.example", first_id).is_none());
    small.put("metrics.example", &first);
    assert!(small.get_by_id("metrics.example", first_id).is_some());
    assert!(
        small
            .get_by_slug("metrics.example", "first-metrics-entry")
            .is_some()
    );
    small.put("metrics.example", &second);

    // expiry
    let expiring = EntryCache::new(&CacheConfig {
        ttl: Duration::ZERO,
        ..Default::default()
    });
    expiring.put("metrics.example", &first);
    assert!(expiring.get_by_id("metrics.example", first_id).is_none());

    let snapshot = snapshotter.snapshot().into_vec();
    let names: HashSet<String> = snapshot
        .iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "entrystore_cache_hit_total",
        "entrystore_cache_miss_total",
        "entrystore_cache_evict_total",
        "entrystore_cache_expire_total",
    ];
    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let hits_by_index: HashSet<String> = snapshot
        .iter()
        .filter(|(composite_key, _, _, _)| {
            composite_key.key().name() == "entrystore_cache_hit_total"
        })
        .filter(|(_, _, _, value)| matches!(value, DebugValue::Counter(count) if *count > 0))
        .flat_map(|(composite_key, _, _, _)| {
            composite_key
                .key()
                .labels()
                .filter(|label| label.key() == "index")
                .map(|label| label.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert_eq!(
        hits_by_index,
        HashSet::from(["id".to_string(), "slug".to_string()])
    );
}
