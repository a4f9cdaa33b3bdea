//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::session::Session;
use crate::domain::entities::{ChangeLogRecord, Entry, FieldChange, Person};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

/// Storage backend for entries. Every call names the site (tenant) it acts on;
/// implementations never return rows belonging to another site.
///
/// Listings are ordered newest first by `date`, falling back to `created`,
/// with ties broken by id (see [`crate::domain::ordering`]). Soft-deleted
/// entries are returned by the lookups and by [`EntryStore::list_all`] only.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Create tables, collections and indexes if they do not exist yet.
    async fn ensure_schema(&self) -> Result<(), RepoError>;

    async fn find_by_id(&self, site: &str, id: Uuid) -> Result<Option<Entry>, RepoError>;

    async fn find_by_slug(&self, site: &str, slug: &str) -> Result<Option<Entry>, RepoError>;

    async fn list_all(&self, site: &str) -> Result<Vec<Entry>, RepoError>;

    /// Entries dated strictly before `now`.
    async fn list_recent(
        &self,
        site: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError>;

    /// Entries dated strictly after `now`.
    async fn list_future(&self, site: &str, now: OffsetDateTime)
    -> Result<Vec<Entry>, RepoError>;

    async fn list_by_author(&self, site: &str, author_id: &str) -> Result<Vec<Entry>, RepoError>;

    /// Published entries whose search tags contain `tag_key`.
    async fn list_by_tag(
        &self,
        site: &str,
        tag_key: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError>;

    /// Entries matching `terms`, which arrive longest first.
    async fn search(&self, site: &str, terms: &[String]) -> Result<Vec<Entry>, RepoError>;

    /// Insert or replace the entry. The stored `created` value survives a
    /// replace.
    async fn put(&self, site: &str, entry: &Entry) -> Result<(), RepoError>;

    /// Returns whether a row was removed.
    async fn delete(&self, site: &str, id: Uuid) -> Result<bool, RepoError>;
}

/// Audit rows produced by one mutation.
#[derive(Debug, Clone)]
pub struct ChangeBatch {
    pub entity_id: Uuid,
    pub person_id: String,
    pub display_name: String,
    pub recorded_at: OffsetDateTime,
    pub changes: Vec<FieldChange>,
}

impl ChangeBatch {
    pub fn into_records(self, site: &str) -> Vec<ChangeLogRecord> {
        let ChangeBatch {
            entity_id,
            person_id,
            display_name,
            recorded_at,
            changes,
        } = self;
        changes
            .into_iter()
            .map(|change| ChangeLogRecord {
                id: Uuid::new_v4(),
                site: site.to_string(),
                entity_id,
                person_id: person_id.clone(),
                display_name: display_name.clone(),
                field: change.field.to_string(),
                old_value: change.old_value,
                new_value: change.new_value,
                created_at: recorded_at,
            })
            .collect()
    }
}

/// Append-only sink for field-level change records.
#[async_trait]
pub trait ChangeLogRepo: Send + Sync {
    async fn append_batch(&self, site: &str, batch: ChangeBatch) -> Result<(), RepoError>;

    /// Records for one entity, oldest first.
    async fn list_for_entity(
        &self,
        site: &str,
        entity_id: Uuid,
    ) -> Result<Vec<ChangeLogRecord>, RepoError>;
}

/// Resolves author ids to people.
#[async_trait]
pub trait PersonDirectory: Send + Sync {
    async fn get_person_cached(
        &self,
        session: &dyn Session,
        id: &str,
    ) -> Result<Option<Person>, RepoError>;
}
