use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{Entry, StoredEntry};

#[derive(sqlx::FromRow)]
pub(crate) struct EntryRow {
    pub(crate) id: Uuid,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) body: String,
    pub(crate) thumbnail: String,
    pub(crate) cover: String,
    pub(crate) tags: Vec<String>,
    pub(crate) entry_date: Option<OffsetDateTime>,
    pub(crate) author_id: Option<String>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
    pub(crate) deleted: bool,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        StoredEntry {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            body: row.body,
            thumbnail: row.thumbnail,
            cover: row.cover,
            tags: row.tags,
            date: row.entry_date,
            author_id: row.author_id,
            created: Some(row.created_at),
            updated: Some(row.updated_at),
            deleted: row.deleted,
        }
        .into()
    }
}
