//! Entry store facade: cache-aside reads, audited writes and author
//! resolution on top of an [`EntryStore`] backend.

mod commands;
mod queries;

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::audit::ChangeLogService;
use crate::application::error::StoreError;
use crate::application::repos::{EntryStore, PersonDirectory};
use crate::application::session::Session;
use crate::cache::EntryCache;
use crate::domain::entities::{Entry, Person};

#[derive(Clone)]
pub struct EntryService {
    pub(crate) store: Arc<dyn EntryStore>,
    pub(crate) cache: Arc<EntryCache>,
    pub(crate) people: Arc<dyn PersonDirectory>,
    pub(crate) audit: ChangeLogService,
}

impl EntryService {
    pub fn new(
        store: Arc<dyn EntryStore>,
        cache: Arc<EntryCache>,
        people: Arc<dyn PersonDirectory>,
        audit: ChangeLogService,
    ) -> Self {
        Self {
            store,
            cache,
            people,
            audit,
        }
    }

    /// A blank entry for callers to fill in and pass to `add_entry`.
    pub fn new_entry(&self) -> Entry {
        Entry::new()
    }

    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    /// Resolve the entry's author through the person directory unless the
    /// attached person already matches its author id.
    pub(crate) async fn resolve_author(
        &self,
        session: &dyn Session,
        entry: &mut Entry,
    ) -> Result<(), StoreError> {
        let Some(author_id) = entry.author_id().map(str::to_string) else {
            entry.attach_author(None);
            return Ok(());
        };
        if entry.author().is_some_and(|person| person.id == author_id) {
            return Ok(());
        }

        let person = self.people.get_person_cached(session, &author_id).await?;
        entry.attach_author(person);
        Ok(())
    }

    /// Like [`Self::resolve_author`] for a whole listing; each distinct author
    /// is looked up once.
    pub(crate) async fn resolve_authors(
        &self,
        session: &dyn Session,
        entries: &mut [Entry],
    ) -> Result<(), StoreError> {
        let mut resolved: HashMap<String, Option<Person>> = HashMap::new();
        for entry in entries.iter_mut() {
            let Some(author_id) = entry.author_id().map(str::to_string) else {
                continue;
            };
            let person = match resolved.get(&author_id) {
                Some(person) => person.clone(),
                None => {
                    let person = self.people.get_person_cached(session, &author_id).await?;
                    resolved.insert(author_id, person.clone());
                    person
                }
            };
            entry.attach_author(person);
        }
        Ok(())
    }
}

/// Every operation needs a site; an empty one stands for a missing session.
pub(crate) fn require_site(session: &dyn Session) -> Result<&str, StoreError> {
    let site = session.site();
    if site.is_empty() {
        return Err(StoreError::InvalidSession);
    }
    Ok(site)
}

pub(crate) fn require_authenticated(session: &dyn Session) -> Result<(), StoreError> {
    if !session.is_authenticated() {
        return Err(StoreError::Unauthenticated);
    }
    Ok(())
}
