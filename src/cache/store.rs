//! Entry cache storage.
//!
//! Two LRU caches, by id and by slug, each value stamped with an expiry
//! instant. Every call takes one lock at a time; there is no atomicity
//! across a get followed by a put.

use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use uuid::Uuid;

use crate::domain::entities::Entry;

use super::config::CacheConfig;
use super::keys::{IdKey, SlugKey};
use super::lock::{rw_read, rw_write};

pub(crate) const METRIC_HIT: &str = "entrystore_cache_hit_total";
pub(crate) const METRIC_MISS: &str = "entrystore_cache_miss_total";
pub(crate) const METRIC_EVICT: &str = "entrystore_cache_evict_total";
pub(crate) const METRIC_EXPIRE: &str = "entrystore_cache_expire_total";

const INDEX_ID: &str = "id";
const INDEX_SLUG: &str = "slug";

#[derive(Clone)]
struct Cached {
    entry: Entry,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

/// Read-through cache for entries, keyed by `(site, id)` and `(site, slug)`.
pub struct EntryCache {
    ttl: Duration,
    by_id: RwLock<LruCache<IdKey, Cached>>,
    by_slug: RwLock<LruCache<SlugKey, Cached>>,
}

impl EntryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            by_id: RwLock::new(LruCache::new(config.capacity_non_zero())),
            by_slug: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn get_by_id(&self, site: &str, id: Uuid) -> Option<Entry> {
        let key = IdKey::new(site, id);
        let mut cache = rw_write(&self.by_id, "get_by_id");
        lookup(&mut cache, &key, INDEX_ID)
    }

    pub fn get_by_slug(&self, site: &str, slug: &str) -> Option<Entry> {
        let key = SlugKey::new(site, slug);
        let mut cache = rw_write(&self.by_slug, "get_by_slug");
        lookup(&mut cache, &key, INDEX_SLUG)
    }

    /// Store `entry` under both keys. Entries without an id are ignored and an
    /// empty slug only fills the id cache.
    pub fn put(&self, site: &str, entry: &Entry) {
        let Some(id) = entry.id() else {
            return;
        };
        let cached = Cached {
            entry: entry.clone(),
            expires_at: Instant::now().checked_add(self.ttl),
        };

        if !entry.slug().is_empty() {
            let key = SlugKey::new(site, entry.slug());
            let mut cache = rw_write(&self.by_slug, "put.by_slug");
            insert(&mut cache, key, cached.clone(), INDEX_SLUG);
        }

        let key = IdKey::new(site, id);
        let mut cache = rw_write(&self.by_id, "put.by_id");
        insert(&mut cache, key, cached, INDEX_ID);
    }

    pub fn invalidate_slug(&self, site: &str, slug: &str) {
        rw_write(&self.by_slug, "invalidate_slug").pop(&SlugKey::new(site, slug));
    }

    /// Drop both keys of one entry.
    pub fn invalidate(&self, site: &str, id: Uuid, slug: &str) {
        rw_write(&self.by_id, "invalidate.by_id").pop(&IdKey::new(site, id));
        self.invalidate_slug(site, slug);
    }

    /// Number of entries held in the id and slug caches.
    pub fn len(&self) -> (usize, usize) {
        (
            rw_read(&self.by_id, "len.by_id").len(),
            rw_read(&self.by_slug, "len.by_slug").len(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.len() == (0, 0)
    }
}

fn lookup<K: Hash + Eq>(
    cache: &mut LruCache<K, Cached>,
    key: &K,
    index: &'static str,
) -> Option<Entry> {
    let expired = match cache.get(key) {
        Some(cached) if cached.expires_at.is_none_or(|at| at > Instant::now()) => {
            counter!(METRIC_HIT, "index" => index).increment(1);
            return Some(cached.entry.clone());
        }
        Some(_) => true,
        None => false,
    };

    if expired {
        cache.pop(key);
        counter!(METRIC_EXPIRE, "index" => index).increment(1);
    }
    counter!(METRIC_MISS, "index" => index).increment(1);
    None
}

fn insert<K: Hash + Eq>(
    cache: &mut LruCache<K, Cached>,
    key: K,
    value: Cached,
    index: &'static str,
) {
    if cache.contains(&key) {
        cache.put(key, value);
    } else if cache.push(key, value).is_some() {
        counter!(METRIC_EVICT, "index" => index).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use time::OffsetDateTime;

    use super::*;

    fn sample_entry(title: &str) -> Entry {
        let mut entry = Entry::new();
        entry.set_title(title);
        entry.set_body("body");
        entry.mark_created(OffsetDateTime::now_utc());
        entry
    }

    fn entry_id(entry: &Entry) -> Uuid {
        entry.id().expect("sample entries carry an id")
    }

    #[test]
    fn entry_cache_roundtrip() {
        let cache = EntryCache::new(&CacheConfig::default());
        let entry = sample_entry("Test Entry");
        let id = entry_id(&entry);

        assert!(cache.get_by_id("site", id).is_none());

        cache.put("site", &entry);

        let cached = cache.get_by_id("site", id).expect("cached by id");
        assert_eq!(cached.slug(), "test-entry");

        let by_slug = cache
            .get_by_slug("site", "test-entry")
            .expect("cached by slug");
        assert_eq!(by_slug.id(), Some(id));

        cache.invalidate("site", id, "test-entry");

        assert!(cache.get_by_id("site", id).is_none());
        assert!(cache.get_by_slug("site", "test-entry").is_none());
    }

    #[test]
    fn sites_do_not_share_entries() {
        let cache = EntryCache::new(&CacheConfig::default());
        let entry = sample_entry("Shared Slug");
        cache.put("one", &entry);

        assert!(cache.get_by_id("two", entry_id(&entry)).is_none());
        assert!(cache.get_by_slug("two", "shared-slug").is_none());
        assert!(cache.get_by_slug("one", "shared-slug").is_some());
    }

    #[test]
    fn unsaved_entries_are_not_cached() {
        let cache = EntryCache::new(&CacheConfig::default());
        let mut entry = Entry::new();
        entry.set_title("Draft");
        cache.put("site", &entry);
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entries_miss() {
        let cache = EntryCache::new(&CacheConfig {
            ttl: Duration::ZERO,
            ..Default::default()
        });
        let entry = sample_entry("Short Lived");
        cache.put("site", &entry);
        assert_eq!(cache.len(), (1, 1));

        assert!(cache.get_by_id("site", entry_id(&entry)).is_none());
        assert!(cache.get_by_slug("site", "short-lived").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn unrepresentable_ttl_never_expires() {
        let cache = EntryCache::new(&CacheConfig {
            capacity: 4,
            ttl: Duration::from_secs(u64::MAX),
        });
        let entry = sample_entry("Long Lived");
        cache.put("site", &entry);

        assert!(cache.get_by_id("site", entry_id(&entry)).is_some());
        assert!(cache.get_by_slug("site", "long-lived").is_some());
    }

    #[test]
    fn lru_eviction() {
        let cache = EntryCache::new(&CacheConfig {
            capacity: 2,
            ..Default::default()
        });

        let first = sample_entry("Entry 1");
        let second = sample_entry("Entry 2");
        let third = sample_entry("Entry 3");

        cache.put("site", &first);
        cache.put("site", &second);

        assert!(cache.get_by_id("site", entry_id(&first)).is_some());
        assert!(cache.get_by_id("site", entry_id(&second)).is_some());

        // `first` was read before `second`, so it is the least recent.
        cache.put("site", &third);

        assert!(cache.get_by_id("site", entry_id(&first)).is_none());
        assert!(cache.get_by_id("site", entry_id(&second)).is_some());
        assert!(cache.get_by_id("site", entry_id(&third)).is_some());
    }

    #[test]
    fn rewriting_a_key_replaces_the_value() {
        let cache = EntryCache::new(&CacheConfig::default());
        let mut entry = sample_entry("Title");
        cache.put("site", &entry);

        entry.set_description("changed");
        cache.put("site", &entry);

        let cached = cache
            .get_by_id("site", entry_id(&entry))
            .expect("cached by id");
        assert_eq!(cached.description(), "changed");
        assert_eq!(cache.len(), (1, 1));
    }

    #[test]
    fn cache_recovers_from_poisoned_lock() {
        let cache = EntryCache::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache
                .by_id
                .write()
                .expect("by_id lock should be acquired");
            panic!("poison by_id lock");
        }));

        let entry = sample_entry("After Panic");
        cache.put("site", &entry);
        assert!(cache.get_by_id("site", entry_id(&entry)).is_some());
    }
}
