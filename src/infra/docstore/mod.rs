//! MongoDB-backed entry store.
//!
//! Each site gets its own pair of collections, `entries.<site>` and
//! `entry_change_log.<site>`. Indexes are created the first time a site is
//! touched by this process.

mod audit;
mod error;
mod types;

pub use error::map_mongo_error;

use async_trait::async_trait;
use dashmap::DashSet;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::repos::{EntryStore, RepoError};
use crate::domain::entities::Entry;
use crate::domain::search::SEARCH_LIMIT;

use types::{ChangeDocument, EntryDocument, to_bson_datetime};

const ENTRIES_PREFIX: &str = "entries";
const CHANGE_LOG_PREFIX: &str = "entry_change_log";
/// Filters applied by a keyword search; longer queries are cut to this many
/// leading terms.
const MAX_SEARCH_FILTERS: usize = 2;

pub struct MongoEntryStore {
    database: Database,
    initialised: DashSet<String>,
}

impl MongoEntryStore {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            initialised: DashSet::new(),
        }
    }

    pub async fn connect(url: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(url).await?;
        Ok(Self::new(client.database(database)))
    }

    pub async fn health_check(&self) -> Result<(), RepoError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }

    fn collection_name(prefix: &str, site: &str) -> Result<String, RepoError> {
        if site.is_empty() || site.contains(['$', '\0']) {
            return Err(RepoError::InvalidInput {
                message: format!("site `{site}` cannot name a collection"),
            });
        }
        Ok(format!("{prefix}.{site}"))
    }

    /// The site's entry collection, with indexes in place.
    async fn entries(&self, site: &str) -> Result<Collection<EntryDocument>, RepoError> {
        let collection = self
            .database
            .collection::<EntryDocument>(&Self::collection_name(ENTRIES_PREFIX, site)?);
        self.ensure_site_indexes(site).await?;
        Ok(collection)
    }

    async fn change_log(&self, site: &str) -> Result<Collection<ChangeDocument>, RepoError> {
        let collection = self
            .database
            .collection::<ChangeDocument>(&Self::collection_name(CHANGE_LOG_PREFIX, site)?);
        self.ensure_site_indexes(site).await?;
        Ok(collection)
    }

    #[instrument(skip(self))]
    async fn ensure_site_indexes(&self, site: &str) -> Result<(), RepoError> {
        if self.initialised.contains(site) {
            return Ok(());
        }

        let entries = self
            .database
            .collection::<Document>(&Self::collection_name(ENTRIES_PREFIX, site)?);
        let indexes = [
            IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(
                    IndexOptions::builder()
                        .name("slug_unique".to_string())
                        .unique(true)
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "search_tags": 1 })
                .build(),
            IndexModel::builder().keys(doc! { "author": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "sort_time": -1, "_id": -1 })
                .build(),
        ];
        entries
            .create_indexes(indexes)
            .await
            .map_err(map_mongo_error)?;

        let change_log = self
            .database
            .collection::<Document>(&Self::collection_name(CHANGE_LOG_PREFIX, site)?);
        change_log
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "entity_id": 1, "recorded_nanos": 1, "seq": 1 })
                    .build(),
            )
            .await
            .map_err(map_mongo_error)?;

        self.initialised.insert(site.to_string());
        debug!(site, "document indexes ready");
        Ok(())
    }

    async fn find_one(&self, site: &str, filter: Document) -> Result<Option<Entry>, RepoError> {
        let document = self
            .entries(site)
            .await?
            .find_one(filter)
            .await
            .map_err(map_mongo_error)?;
        document.map(Entry::try_from).transpose()
    }

    async fn find_many(
        &self,
        site: &str,
        filter: Document,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>, RepoError> {
        // The server reads `limit: 0` as unlimited.
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let collection = self.entries(site).await?;
        let mut find = collection
            .find(filter)
            .sort(doc! { "sort_time": -1, "_id": -1 });
        if let Some(limit) = limit {
            let limit = i64::try_from(limit).map_err(|_| RepoError::InvalidInput {
                message: format!("limit {limit} exceeds supported range"),
            })?;
            find = find.limit(limit);
        }

        let documents: Vec<EntryDocument> = find
            .await
            .map_err(map_mongo_error)?
            .try_collect()
            .await
            .map_err(map_mongo_error)?;

        documents.into_iter().map(Entry::try_from).collect()
    }
}

fn live() -> Document {
    doc! { "deleted": { "$ne": true } }
}

#[async_trait]
impl EntryStore for MongoEntryStore {
    /// Verify the connection. Per-site indexes are created lazily.
    async fn ensure_schema(&self) -> Result<(), RepoError> {
        self.health_check().await
    }

    async fn find_by_id(&self, site: &str, id: Uuid) -> Result<Option<Entry>, RepoError> {
        self.find_one(site, doc! { "_id": id.to_string() }).await
    }

    async fn find_by_slug(&self, site: &str, slug: &str) -> Result<Option<Entry>, RepoError> {
        self.find_one(site, doc! { "slug": slug }).await
    }

    async fn list_all(&self, site: &str) -> Result<Vec<Entry>, RepoError> {
        self.find_many(site, doc! {}, None).await
    }

    async fn list_recent(
        &self,
        site: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut filter = live();
        filter.insert("date", doc! { "$lt": to_bson_datetime(now) });
        self.find_many(site, filter, Some(limit)).await
    }

    async fn list_future(
        &self,
        site: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut filter = live();
        filter.insert("date", doc! { "$gt": to_bson_datetime(now) });
        self.find_many(site, filter, None).await
    }

    async fn list_by_author(&self, site: &str, author_id: &str) -> Result<Vec<Entry>, RepoError> {
        let mut filter = live();
        filter.insert("author", author_id);
        self.find_many(site, filter, None).await
    }

    async fn list_by_tag(
        &self,
        site: &str,
        tag_key: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut filter = live();
        filter.insert("search_tags", tag_key);
        filter.insert("date", doc! { "$lt": to_bson_datetime(now) });
        self.find_many(site, filter, Some(limit)).await
    }

    async fn search(&self, site: &str, terms: &[String]) -> Result<Vec<Entry>, RepoError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let leading: Vec<&str> = terms
            .iter()
            .take(MAX_SEARCH_FILTERS)
            .map(String::as_str)
            .collect();

        let mut filter = live();
        filter.insert("search_tags", doc! { "$all": leading });
        self.find_many(site, filter, Some(SEARCH_LIMIT)).await
    }

    async fn put(&self, site: &str, entry: &Entry) -> Result<(), RepoError> {
        let document = EntryDocument::from_entry(entry, OffsetDateTime::now_utc())?;
        let update = doc! {
            "$set": document.mutable_fields()?,
            "$setOnInsert": { "created": document.created },
        };

        self.entries(site)
            .await?
            .update_one(doc! { "_id": document.id.as_str() }, update)
            .upsert(true)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn delete(&self, site: &str, id: Uuid) -> Result<bool, RepoError> {
        let result = self
            .entries(site)
            .await?
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(map_mongo_error)?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_scoped_by_site() {
        assert_eq!(
            MongoEntryStore::collection_name(ENTRIES_PREFIX, "blog.example").ok(),
            Some("entries.blog.example".to_string())
        );
        assert!(MongoEntryStore::collection_name(ENTRIES_PREFIX, "bad$site").is_err());
        assert!(MongoEntryStore::collection_name(CHANGE_LOG_PREFIX, "").is_err());
    }
}
