use std::sync::Arc;
use std::time::Duration;

use doc_tools::cache::{ManualClock, TtlCache};

#[test]
fn test_entries_expire_after_ttl() {
    let clock = Arc::new(ManualClock::new());
    let cache: TtlCache<String, String> = TtlCache::new(Duration::from_secs(300), clock.clone());

    cache.insert("redpanda@main:Chart.yaml".to_string(), "version: 5.9.1".to_string());
    clock.advance(Duration::from_secs(299));
    assert_eq!(
        cache.get(&"redpanda@main:Chart.yaml".to_string()).as_deref(),
        Some("version: 5.9.1")
    );

    clock.advance(Duration::from_secs(1));
    assert_eq!(cache.get(&"redpanda@main:Chart.yaml".to_string()), None);
    // An expired read also drops the entry
    assert!(cache.is_empty());
}

#[test]
fn test_prune_removes_only_expired_entries() {
    let clock = Arc::new(ManualClock::new());
    let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60), clock.clone());

    cache.insert("old-a", 1);
    cache.insert("old-b", 2);
    clock.advance(Duration::from_secs(45));
    cache.insert("fresh", 3);
    clock.advance(Duration::from_secs(20));

    assert_eq!(cache.prune(), 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&"fresh"), Some(3));
}

#[test]
fn test_reinsert_resets_the_clock() {
    let clock = Arc::new(ManualClock::new());
    let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(10), clock.clone());

    cache.insert("key", 1);
    clock.advance(Duration::from_secs(8));
    cache.insert("key", 2);
    clock.advance(Duration::from_secs(8));
    assert_eq!(cache.get(&"key"), Some(2));
    assert_eq!(cache.remove(&"key"), Some(2));
}
