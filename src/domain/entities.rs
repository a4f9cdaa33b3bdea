//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::search::compute_search_tags;
use crate::domain::slug::slugify;

/// A person as resolved by the access-control collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// A single published (or future-dated) entry.
///
/// `id`, `created` and `updated` are assigned by the store on first
/// persistence; callers only populate content fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entry {
    id: Option<Uuid>,
    title: String,
    slug: String,
    description: String,
    body: String,
    thumbnail: String,
    cover: String,
    tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    date: Option<OffsetDateTime>,
    author_id: Option<String>,
    author: Option<Person>,
    #[serde(with = "time::serde::rfc3339::option")]
    created: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    updated: Option<OffsetDateTime>,
    deleted: bool,
}

impl Entry {
    /// A blank, unsaved entry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Assign a fresh identifier if none exists yet and return it.
    pub fn ensure_id(&mut self) -> Uuid {
        *self.id.get_or_insert_with(Uuid::new_v4)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title and regenerate the slug from it.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.slug = slugify(&self.title);
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Override the derived slug. The value is normalised with [`slugify`].
    pub fn set_slug(&mut self, slug: &str) {
        self.slug = slugify(slug);
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// The body as served to readers. No rendering stage exists in the store,
    /// so this is the raw body.
    pub fn rendered_body(&self) -> &str {
        &self.body
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    pub fn set_thumbnail(&mut self, thumbnail: impl Into<String>) {
        self.thumbnail = thumbnail.into();
    }

    pub fn cover(&self) -> &str {
        &self.cover
    }

    pub fn set_cover(&mut self, cover: impl Into<String>) {
        self.cover = cover.into();
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
    }

    pub fn date(&self) -> Option<OffsetDateTime> {
        self.date
    }

    pub fn set_date(&mut self, date: Option<OffsetDateTime>) {
        self.date = date;
    }

    pub fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }

    pub fn author(&self) -> Option<&Person> {
        self.author.as_ref()
    }

    /// Attach (or clear) the author. The author id follows the person.
    pub fn set_author(&mut self, author: Option<Person>) {
        self.author_id = author.as_ref().map(|person| person.id.clone());
        self.author = author;
    }

    /// Attach a resolved person without touching the stored author id.
    pub(crate) fn attach_author(&mut self, author: Option<Person>) {
        self.author = author;
    }

    pub fn created(&self) -> Option<OffsetDateTime> {
        self.created
    }

    pub fn updated(&self) -> Option<OffsetDateTime> {
        self.updated
    }

    pub fn deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Index tokens for tag and keyword search, derived from the current
    /// field values.
    pub fn search_tags(&self) -> Vec<String> {
        compute_search_tags(self)
    }

    /// Reject entries that may not be written.
    pub fn validate_for_write(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("entry must have a title"));
        }
        if self.body.trim().is_empty() {
            return Err(DomainError::validation("entry must contain body text"));
        }
        Ok(())
    }

    /// Stamp creation metadata on first persistence.
    pub(crate) fn mark_created(&mut self, now: OffsetDateTime) -> Uuid {
        let id = self.ensure_id();
        self.created = Some(now);
        self.updated = Some(now);
        id
    }

    pub(crate) fn restore_created(&mut self, created: OffsetDateTime) {
        self.created = Some(created);
    }

    pub(crate) fn touch(&mut self, now: OffsetDateTime) {
        self.updated = Some(now);
    }

    /// Copy every authored field from `incoming`, keeping this entry's
    /// identity and timestamps.
    pub(crate) fn absorb_content(&mut self, incoming: &Entry) {
        self.title = incoming.title.clone();
        self.slug = incoming.slug.clone();
        self.description = incoming.description.clone();
        self.body = incoming.body.clone();
        self.thumbnail = incoming.thumbnail.clone();
        self.cover = incoming.cover.clone();
        self.tags = incoming.tags.clone();
        self.date = incoming.date;
        if self.author_id != incoming.author_id {
            self.author = incoming.author.clone();
        }
        self.author_id = incoming.author_id.clone();
        self.deleted = incoming.deleted;
    }
}

/// Field values exactly as a backend stores them. Used by adapters to rebuild
/// an [`Entry`] without re-deriving the slug.
#[derive(Debug, Clone, Default)]
pub struct StoredEntry {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: String,
    pub thumbnail: String,
    pub cover: String,
    pub tags: Vec<String>,
    pub date: Option<OffsetDateTime>,
    pub author_id: Option<String>,
    pub created: Option<OffsetDateTime>,
    pub updated: Option<OffsetDateTime>,
    pub deleted: bool,
}

impl From<StoredEntry> for Entry {
    fn from(stored: StoredEntry) -> Self {
        Self {
            id: Some(stored.id),
            title: stored.title,
            slug: stored.slug,
            description: stored.description,
            body: stored.body,
            thumbnail: stored.thumbnail,
            cover: stored.cover,
            tags: stored.tags,
            date: stored.date,
            author_id: stored.author_id.filter(|value| !value.is_empty()),
            author: None,
            created: stored.created,
            updated: stored.updated,
            deleted: stored.deleted,
        }
    }
}

/// One changed field in an audit batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: String,
    pub new_value: String,
}

/// A persisted audit row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeLogRecord {
    pub id: Uuid,
    pub site: String,
    pub entity_id: Uuid,
    pub person_id: String,
    pub display_name: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
