//! In-process implementations of the storage and collaborator traits.
//!
//! Used by the `memory` backend setting and by tests. Data lives for the
//! lifetime of the value.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::repos::{
    ChangeBatch, ChangeLogRepo, EntryStore, PersonDirectory, RepoError,
};
use crate::application::session::Session;
use crate::domain::entities::{ChangeLogRecord, Entry, Person};
use crate::domain::ordering::sort_entries;
use crate::domain::search::SEARCH_LIMIT;

const SLUG_CONSTRAINT: &str = "entries_site_slug_key";

struct IndexedEntry {
    entry: Entry,
    search_tags: BTreeSet<String>,
}

#[derive(Default)]
struct SiteEntries {
    by_id: HashMap<Uuid, IndexedEntry>,
    slugs: HashMap<String, Uuid>,
    /// search tag → ids of entries indexed under it
    postings: HashMap<String, BTreeSet<Uuid>>,
}

impl SiteEntries {
    fn unindex(&mut self, id: Uuid) -> Option<IndexedEntry> {
        let stored = self.by_id.remove(&id)?;
        if self.slugs.get(stored.entry.slug()) == Some(&id) {
            self.slugs.remove(stored.entry.slug());
        }
        for tag in &stored.search_tags {
            if let Some(ids) = self.postings.get_mut(tag) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(tag);
                }
            }
        }
        Some(stored)
    }

    fn index(&mut self, id: Uuid, stored: IndexedEntry) {
        self.slugs.insert(stored.entry.slug().to_string(), id);
        for tag in &stored.search_tags {
            self.postings.entry(tag.clone()).or_default().insert(id);
        }
        self.by_id.insert(id, stored);
    }

    fn collect<F>(&self, keep: F) -> Vec<Entry>
    where
        F: Fn(&IndexedEntry) -> bool,
    {
        let mut entries: Vec<Entry> = self
            .by_id
            .values()
            .filter(|stored| keep(*stored))
            .map(|stored| stored.entry.clone())
            .collect();
        sort_entries(&mut entries);
        entries
    }
}

/// Entry store held in process memory, with an inverted search-tag index per
/// site.
#[derive(Default)]
pub struct MemoryEntryStore {
    sites: RwLock<HashMap<String, SiteEntries>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_site<F>(&self, site: &str, keep: F) -> Vec<Entry>
    where
        F: Fn(&IndexedEntry) -> bool,
    {
        let sites = self.sites.read().await;
        sites
            .get(site)
            .map(|entries| entries.collect(keep))
            .unwrap_or_default()
    }
}

fn is_live(stored: &IndexedEntry) -> bool {
    !stored.entry.deleted()
}

fn dated_before(stored: &IndexedEntry, now: OffsetDateTime) -> bool {
    stored.entry.date().is_some_and(|date| date < now)
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn ensure_schema(&self) -> Result<(), RepoError> {
        Ok(())
    }

    async fn find_by_id(&self, site: &str, id: Uuid) -> Result<Option<Entry>, RepoError> {
        let sites = self.sites.read().await;
        Ok(sites
            .get(site)
            .and_then(|entries| entries.by_id.get(&id))
            .map(|stored| stored.entry.clone()))
    }

    async fn find_by_slug(&self, site: &str, slug: &str) -> Result<Option<Entry>, RepoError> {
        let sites = self.sites.read().await;
        Ok(sites.get(site).and_then(|entries| {
            entries
                .slugs
                .get(slug)
                .and_then(|id| entries.by_id.get(id))
                .map(|stored| stored.entry.clone())
        }))
    }

    async fn list_all(&self, site: &str) -> Result<Vec<Entry>, RepoError> {
        Ok(self.collect_site(site, |_| true).await)
    }

    async fn list_recent(
        &self,
        site: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut entries = self
            .collect_site(site, |stored| is_live(stored) && dated_before(stored, now))
            .await;
        entries.truncate(limit);
        Ok(entries)
    }

    async fn list_future(
        &self,
        site: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<Entry>, RepoError> {
        Ok(self
            .collect_site(site, |stored| {
                is_live(stored) && stored.entry.date().is_some_and(|date| date > now)
            })
            .await)
    }

    async fn list_by_author(&self, site: &str, author_id: &str) -> Result<Vec<Entry>, RepoError> {
        Ok(self
            .collect_site(site, |stored| {
                is_live(stored) && stored.entry.author_id() == Some(author_id)
            })
            .await)
    }

    async fn list_by_tag(
        &self,
        site: &str,
        tag_key: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut entries = self
            .collect_site(site, |stored| {
                is_live(stored)
                    && dated_before(stored, now)
                    && stored.search_tags.contains(tag_key)
            })
            .await;
        entries.truncate(limit);
        Ok(entries)
    }

    /// Reads the posting list of the leading (longest) term, then checks the
    /// remaining terms against each candidate.
    async fn search(&self, site: &str, terms: &[String]) -> Result<Vec<Entry>, RepoError> {
        let Some((leading, rest)) = terms.split_first() else {
            return Ok(Vec::new());
        };

        let sites = self.sites.read().await;
        let Some(entries) = sites.get(site) else {
            return Ok(Vec::new());
        };
        let Some(candidates) = entries.postings.get(leading) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<Entry> = candidates
            .iter()
            .filter_map(|id| entries.by_id.get(id))
            .filter(|stored| is_live(stored))
            .filter(|stored| rest.iter().all(|term| stored.search_tags.contains(term)))
            .map(|stored| stored.entry.clone())
            .collect();
        sort_entries(&mut matches);
        matches.truncate(SEARCH_LIMIT);
        Ok(matches)
    }

    async fn put(&self, site: &str, entry: &Entry) -> Result<(), RepoError> {
        let id = entry.id().ok_or_else(|| RepoError::InvalidInput {
            message: "entry has no id".to_string(),
        })?;

        let mut sites = self.sites.write().await;
        let entries = sites.entry(site.to_string()).or_default();

        if let Some(owner) = entries.slugs.get(entry.slug())
            && *owner != id
        {
            return Err(RepoError::Duplicate {
                constraint: SLUG_CONSTRAINT.to_string(),
            });
        }

        let previous = entries.unindex(id);
        let search_tags = entry.search_tags().into_iter().collect();
        let mut stored = entry.clone();
        stored.attach_author(None);
        if let Some(created) = previous.and_then(|previous| previous.entry.created()) {
            stored.restore_created(created);
        }

        entries.index(
            id,
            IndexedEntry {
                entry: stored,
                search_tags,
            },
        );
        Ok(())
    }

    async fn delete(&self, site: &str, id: Uuid) -> Result<bool, RepoError> {
        let mut sites = self.sites.write().await;
        Ok(sites
            .get_mut(site)
            .and_then(|entries| entries.unindex(id))
            .is_some())
    }
}

/// Change log held in process memory.
#[derive(Default)]
pub struct MemoryChangeLog {
    records: RwLock<HashMap<(String, Uuid), Vec<ChangeLogRecord>>>,
}

impl MemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all sites and entities.
    pub async fn len(&self) -> usize {
        self.records.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ChangeLogRepo for MemoryChangeLog {
    async fn append_batch(&self, site: &str, batch: ChangeBatch) -> Result<(), RepoError> {
        let key = (site.to_string(), batch.entity_id);
        let records = batch.into_records(site);
        self.records
            .write()
            .await
            .entry(key)
            .or_default()
            .extend(records);
        Ok(())
    }

    async fn list_for_entity(
        &self,
        site: &str,
        entity_id: Uuid,
    ) -> Result<Vec<ChangeLogRecord>, RepoError> {
        Ok(self
            .records
            .read()
            .await
            .get(&(site.to_string(), entity_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// Fixed person directory.
#[derive(Debug, Default, Clone)]
pub struct StaticPersonDirectory {
    people: HashMap<String, Person>,
}

impl StaticPersonDirectory {
    pub fn new<I>(people: I) -> Self
    where
        I: IntoIterator<Item = Person>,
    {
        Self {
            people: people
                .into_iter()
                .map(|person| (person.id.clone(), person))
                .collect(),
        }
    }
}

#[async_trait]
impl PersonDirectory for StaticPersonDirectory {
    async fn get_person_cached(
        &self,
        _session: &dyn Session,
        id: &str,
    ) -> Result<Option<Person>, RepoError> {
        Ok(self.people.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn entry(title: &str, date: Option<OffsetDateTime>, tags: &[&str]) -> Entry {
        let mut entry = Entry::new();
        entry.set_title(title);
        entry.set_body("body");
        entry.set_tags(tags.iter().copied());
        entry.set_date(date);
        entry.mark_created(datetime!(2020-01-01 00:00 UTC));
        entry
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let store = MemoryEntryStore::new();
        store
            .put("site", &entry("Same", None, &[]))
            .await
            .expect("first put");

        let result = store.put("site", &entry("Same", None, &[])).await;
        assert!(matches!(result, Err(RepoError::Duplicate { .. })));

        // A different site may reuse the slug.
        store
            .put("other", &entry("Same", None, &[]))
            .await
            .expect("slug is per site");
    }

    #[tokio::test]
    async fn put_keeps_original_created() {
        let store = MemoryEntryStore::new();
        let mut original = entry("Original", None, &[]);
        let id = original.ensure_id();
        store.put("site", &original).await.expect("put");

        original.mark_created(datetime!(2030-01-01 00:00 UTC));
        store.put("site", &original).await.expect("replace");

        let stored = store
            .find_by_id("site", id)
            .await
            .expect("lookup")
            .expect("entry present");
        assert_eq!(stored.created(), Some(datetime!(2020-01-01 00:00 UTC)));
    }

    #[tokio::test]
    async fn renaming_moves_the_slug_index() {
        let store = MemoryEntryStore::new();
        let mut item = entry("Before", None, &[]);
        store.put("site", &item).await.expect("put");

        item.set_title("After");
        store.put("site", &item).await.expect("replace");

        assert!(store.find_by_slug("site", "before").await.expect("lookup").is_none());
        assert!(store.find_by_slug("site", "after").await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn search_requires_every_term() {
        let store = MemoryEntryStore::new();
        let when = Some(datetime!(2000-01-01 00:00 UTC));
        store
            .put("site", &entry("Rust async guide", when, &["tokio"]))
            .await
            .expect("put");
        store
            .put("site", &entry("Rust basics", when, &[]))
            .await
            .expect("put");

        let hits = store
            .search("site", &["async".to_string(), "rust".to_string()])
            .await
            .expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug(), "rust-async-guide");

        let hits = store
            .search("site", &["rust".to_string()])
            .await
            .expect("search");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn delete_drops_postings() {
        let store = MemoryEntryStore::new();
        let item = entry("Gone", Some(datetime!(2000-01-01 00:00 UTC)), &["x"]);
        let id = item.id().expect("saved entry has id");
        store.put("site", &item).await.expect("put");

        assert!(store.delete("site", id).await.expect("delete"));
        assert!(!store.delete("site", id).await.expect("second delete"));
        assert!(
            store
                .search("site", &["gone".to_string()])
                .await
                .expect("search")
                .is_empty()
        );
    }
}
