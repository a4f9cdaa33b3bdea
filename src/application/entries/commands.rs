use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::error::StoreError;
use crate::application::session::Session;
use crate::domain::audit::{creation_changes, diff_entries};
use crate::domain::entities::Entry;
use crate::domain::error::DomainError;

use super::{EntryService, require_authenticated, require_site};

impl EntryService {
    /// Persist a new entry. The change log is written before the entry; if
    /// the entry write then fails the log keeps a record of an entry that
    /// does not exist.
    #[instrument(skip_all, fields(site = session.site()))]
    pub async fn add_entry(
        &self,
        session: &dyn Session,
        mut entry: Entry,
    ) -> Result<Entry, StoreError> {
        let site = require_site(session)?;
        require_authenticated(session)?;
        entry.validate_for_write()?;

        let id = entry.mark_created(OffsetDateTime::now_utc());
        self.resolve_author(session, &mut entry).await?;

        self.audit
            .record(session, id, creation_changes(&entry))
            .await
            .map_err(StoreError::Audit)?;
        self.store.put(site, &entry).await?;
        self.cache.put(site, &entry);

        info!(%id, slug = entry.slug(), "entry created");
        Ok(entry)
    }

    /// Apply `incoming` over the stored entry. Nothing is written when no
    /// audited field differs.
    #[instrument(skip_all, fields(site = session.site(), id = ?incoming.id()))]
    pub async fn update_entry(
        &self,
        session: &dyn Session,
        mut incoming: Entry,
    ) -> Result<Entry, StoreError> {
        let site = require_site(session)?;
        require_authenticated(session)?;
        incoming.validate_for_write()?;

        let id = incoming.id().ok_or_else(|| StoreError::not_found(None))?;
        let mut current = self
            .store
            .find_by_id(site, id)
            .await?
            .ok_or_else(|| StoreError::not_found(Some(id)))?;

        self.resolve_author(session, &mut current).await?;
        self.resolve_author(session, &mut incoming).await?;

        let changes = diff_entries(&current, &incoming);
        if changes.is_empty() {
            return Ok(current);
        }
        let changed = changes.len();

        self.audit
            .record(session, id, changes)
            .await
            .map_err(StoreError::Audit)?;

        let previous_slug = current.slug().to_string();
        current.absorb_content(&incoming);
        current.touch(OffsetDateTime::now_utc());

        self.cache.invalidate_slug(site, &previous_slug);
        self.store.put(site, &current).await?;
        self.cache.put(site, &current);

        info!(%id, changed, "entry updated");
        Ok(current)
    }

    /// Remove an entry from the backend and both caches.
    #[instrument(skip(self, session), fields(site = session.site()))]
    pub async fn delete_entry(&self, session: &dyn Session, id: Uuid) -> Result<(), StoreError> {
        let site = require_site(session)?;
        if id.is_nil() {
            return Err(DomainError::validation("entry id must be set").into());
        }
        require_authenticated(session)?;

        let entry = self
            .get_entry_cached(session, id)
            .await?
            .ok_or_else(|| StoreError::not_found(Some(id)))?;

        let removed = self.store.delete(site, id).await?;
        self.cache.invalidate(site, id, entry.slug());

        info!(%id, removed, "entry deleted");
        Ok(())
    }
}
