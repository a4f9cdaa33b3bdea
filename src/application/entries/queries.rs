use time::OffsetDateTime;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::error::StoreError;
use crate::application::session::Session;
use crate::domain::entities::{ChangeLogRecord, Entry};
use crate::domain::search::{SEARCH_LIMIT, search_terms, tag_key};

use super::{EntryService, require_site};

impl EntryService {
    /// Read an entry straight from the backend and refresh both caches with it.
    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn get_entry(
        &self,
        session: &dyn Session,
        id: Uuid,
    ) -> Result<Option<Entry>, StoreError> {
        let site = require_site(session)?;
        if id.is_nil() {
            return Ok(None);
        }

        let found = self.store.find_by_id(site, id).await?;
        self.fill_cache(session, found).await
    }

    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn get_entry_cached(
        &self,
        session: &dyn Session,
        id: Uuid,
    ) -> Result<Option<Entry>, StoreError> {
        let site = require_site(session)?;
        if id.is_nil() {
            return Ok(None);
        }

        if let Some(entry) = self.cache.get_by_id(site, id) {
            return Ok(Some(entry));
        }
        debug!(%id, "entry cache miss");

        let found = self.store.find_by_id(site, id).await?;
        self.fill_cache(session, found).await
    }

    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn get_entry_by_slug(
        &self,
        session: &dyn Session,
        slug: &str,
    ) -> Result<Option<Entry>, StoreError> {
        let site = require_site(session)?;
        if slug.is_empty() {
            return Ok(None);
        }

        let found = self.store.find_by_slug(site, slug).await?;
        self.fill_cache(session, found).await
    }

    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn get_entry_by_slug_cached(
        &self,
        session: &dyn Session,
        slug: &str,
    ) -> Result<Option<Entry>, StoreError> {
        let site = require_site(session)?;
        if slug.is_empty() {
            return Ok(None);
        }

        if let Some(entry) = self.cache.get_by_slug(site, slug) {
            return Ok(Some(entry));
        }
        debug!(slug, "entry cache miss");

        let found = self.store.find_by_slug(site, slug).await?;
        self.fill_cache(session, found).await
    }

    /// Every entry of the site, deleted and undated ones included.
    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn list_entries(&self, session: &dyn Session) -> Result<Vec<Entry>, StoreError> {
        let site = require_site(session)?;
        let entries = self.store.list_all(site).await?;
        self.with_authors(session, entries).await
    }

    /// Published entries, newest first.
    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn list_recent(
        &self,
        session: &dyn Session,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        let site = require_site(session)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let entries = self
            .store
            .list_recent(site, OffsetDateTime::now_utc(), limit)
            .await?;
        self.with_authors(session, entries).await
    }

    /// Entries dated after now.
    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn list_future(&self, session: &dyn Session) -> Result<Vec<Entry>, StoreError> {
        let site = require_site(session)?;
        let entries = self
            .store
            .list_future(site, OffsetDateTime::now_utc())
            .await?;
        self.with_authors(session, entries).await
    }

    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn list_by_tag(
        &self,
        session: &dyn Session,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Entry>, StoreError> {
        let site = require_site(session)?;
        if limit == 0 {
            return Ok(Vec::new());
        }
        let entries = self
            .store
            .list_by_tag(site, &tag_key(tag), OffsetDateTime::now_utc(), limit)
            .await?;
        self.with_authors(session, entries).await
    }

    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn list_by_author(
        &self,
        session: &dyn Session,
        author_id: &str,
    ) -> Result<Vec<Entry>, StoreError> {
        let site = require_site(session)?;
        let entries = self.store.list_by_author(site, author_id).await?;
        self.with_authors(session, entries).await
    }

    /// Keyword search over title words, tags, years and author names. At most
    /// [`SEARCH_LIMIT`] entries come back.
    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn search(
        &self,
        session: &dyn Session,
        query: &str,
    ) -> Result<Vec<Entry>, StoreError> {
        let site = require_site(session)?;
        let terms = search_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut entries = self.store.search(site, &terms).await?;
        entries.truncate(SEARCH_LIMIT);
        debug!(terms = terms.len(), hits = entries.len(), "search finished");
        self.with_authors(session, entries).await
    }

    /// Field-level change log of one entry, oldest first.
    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn change_history(
        &self,
        session: &dyn Session,
        id: Uuid,
    ) -> Result<Vec<ChangeLogRecord>, StoreError> {
        let site = require_site(session)?;
        Ok(self.audit.history(site, id).await?)
    }

    async fn fill_cache(
        &self,
        session: &dyn Session,
        found: Option<Entry>,
    ) -> Result<Option<Entry>, StoreError> {
        let Some(mut entry) = found else {
            return Ok(None);
        };
        self.resolve_author(session, &mut entry).await?;
        self.cache.put(session.site(), &entry);
        Ok(Some(entry))
    }

    async fn with_authors(
        &self,
        session: &dyn Session,
        mut entries: Vec<Entry>,
    ) -> Result<Vec<Entry>, StoreError> {
        self.resolve_authors(session, &mut entries).await?;
        Ok(entries)
    }
}
