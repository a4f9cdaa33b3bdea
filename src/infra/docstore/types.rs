use mongodb::bson::{self, Document};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::{ChangeLogRecord, Entry, StoredEntry};
use crate::domain::ordering::primary_time;

/// Stored shape of an entry. `_id` is the hyphenated entry id, so string order
/// matches id order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EntryDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub search_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// `date` if set, else `created`; the listing sort key.
    pub sort_time: bson::DateTime,
    pub created: bson::DateTime,
    pub updated: bson::DateTime,
    #[serde(default)]
    pub deleted: bool,
}

impl EntryDocument {
    pub(crate) fn from_entry(entry: &Entry, now: OffsetDateTime) -> Result<Self, RepoError> {
        let id = entry.id().ok_or_else(|| RepoError::InvalidInput {
            message: "entry has no id".to_string(),
        })?;
        let created = entry.created().unwrap_or(now);
        let updated = entry.updated().unwrap_or(created);
        let sort_time = primary_time(entry).unwrap_or(created);

        Ok(Self {
            id: id.to_string(),
            slug: entry.slug().to_string(),
            title: entry.title().to_string(),
            description: entry.description().to_string(),
            body: entry.body().to_string(),
            thumbnail: entry.thumbnail().to_string(),
            cover: entry.cover().to_string(),
            tags: entry.tags().to_vec(),
            search_tags: entry.search_tags(),
            date: entry.date().map(to_bson_datetime),
            author: entry.author_id().map(str::to_string),
            sort_time: to_bson_datetime(sort_time),
            created: to_bson_datetime(created),
            updated: to_bson_datetime(updated),
            deleted: entry.deleted(),
        })
    }

    /// Fields rewritten on every upsert. `_id` and `created` are excluded.
    pub(crate) fn mutable_fields(&self) -> Result<Document, RepoError> {
        let mut fields = bson::to_document(self).map_err(RepoError::from_persistence)?;
        fields.remove("_id");
        fields.remove("created");
        if self.date.is_none() {
            fields.insert("date", bson::Bson::Null);
        }
        if self.author.is_none() {
            fields.insert("author", bson::Bson::Null);
        }
        Ok(fields)
    }
}

impl TryFrom<EntryDocument> for Entry {
    type Error = RepoError;

    fn try_from(document: EntryDocument) -> Result<Self, Self::Error> {
        let id = parse_id(&document.id)?;
        Ok(StoredEntry {
            id,
            title: document.title,
            slug: document.slug,
            description: document.description,
            body: document.body,
            thumbnail: document.thumbnail,
            cover: document.cover,
            tags: document.tags,
            date: document.date.map(from_bson_datetime).transpose()?,
            author_id: document.author,
            created: Some(from_bson_datetime(document.created)?),
            updated: Some(from_bson_datetime(document.updated)?),
            deleted: document.deleted,
        }
        .into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChangeDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub entity_id: String,
    pub person_id: String,
    pub display_name: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub created_at: bson::DateTime,
    /// `created_at` in nanoseconds. Orders batches written within one millisecond.
    pub recorded_nanos: i64,
    /// Position within the batch it was written in.
    pub seq: i64,
}

impl ChangeDocument {
    pub(crate) fn from_record(record: &ChangeLogRecord, seq: usize) -> Self {
        Self {
            id: record.id.to_string(),
            entity_id: record.entity_id.to_string(),
            person_id: record.person_id.clone(),
            display_name: record.display_name.clone(),
            field: record.field.clone(),
            old_value: record.old_value.clone(),
            new_value: record.new_value.clone(),
            created_at: to_bson_datetime(record.created_at),
            recorded_nanos: saturating_nanos(record.created_at),
            seq: i64::try_from(seq).unwrap_or(i64::MAX),
        }
    }

    pub(crate) fn into_record(self, site: &str) -> Result<ChangeLogRecord, RepoError> {
        Ok(ChangeLogRecord {
            id: parse_id(&self.id)?,
            site: site.to_string(),
            entity_id: parse_id(&self.entity_id)?,
            person_id: self.person_id,
            display_name: self.display_name,
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            created_at: OffsetDateTime::from_unix_timestamp_nanos(i128::from(
                self.recorded_nanos,
            ))
            .map_err(|err| RepoError::integrity(format!("stored timestamp out of range: {err}")))?,
        })
    }
}

/// Millisecond precision; sub-millisecond digits are dropped.
pub(crate) fn to_bson_datetime(value: OffsetDateTime) -> bson::DateTime {
    let millis = value.unix_timestamp_nanos() / 1_000_000;
    bson::DateTime::from_millis(i64::try_from(millis).unwrap_or(i64::MAX))
}

/// Nanoseconds since the epoch, pinned to the `i64` range (years 1677 to 2262).
fn saturating_nanos(value: OffsetDateTime) -> i64 {
    let nanos = value.unix_timestamp_nanos();
    i64::try_from(nanos).unwrap_or(if nanos < 0 { i64::MIN } else { i64::MAX })
}

pub(crate) fn from_bson_datetime(value: bson::DateTime) -> Result<OffsetDateTime, RepoError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(value.timestamp_millis()) * 1_000_000)
        .map_err(|err| RepoError::integrity(format!("stored timestamp out of range: {err}")))
}

fn parse_id(value: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(value)
        .map_err(|err| RepoError::integrity(format!("stored id `{value}` is not a uuid: {err}")))
}
