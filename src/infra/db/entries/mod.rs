//! `entries` table adapter.

mod read;
mod types;
mod write;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{EntryStore, RepoError};
use crate::domain::entities::Entry;

use super::PostgresRepositories;

#[async_trait]
impl EntryStore for PostgresRepositories {
    async fn ensure_schema(&self) -> Result<(), RepoError> {
        self.health_check().await?;
        self.create_schema().await?;
        debug!(backend = "postgres", "entries schema ready");
        Ok(())
    }

    async fn find_by_id(&self, site: &str, id: Uuid) -> Result<Option<Entry>, RepoError> {
        self.fetch_by_id(site, id).await
    }

    async fn find_by_slug(&self, site: &str, slug: &str) -> Result<Option<Entry>, RepoError> {
        self.fetch_by_slug(site, slug).await
    }

    async fn list_all(&self, site: &str) -> Result<Vec<Entry>, RepoError> {
        self.fetch_all(site).await
    }

    async fn list_recent(
        &self,
        site: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        self.fetch_recent(site, now, limit).await
    }

    async fn list_future(
        &self,
        site: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<Entry>, RepoError> {
        self.fetch_future(site, now).await
    }

    async fn list_by_author(&self, site: &str, author_id: &str) -> Result<Vec<Entry>, RepoError> {
        self.fetch_by_author(site, author_id).await
    }

    async fn list_by_tag(
        &self,
        site: &str,
        tag_key: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        self.fetch_by_tag(site, tag_key, now, limit).await
    }

    async fn search(&self, site: &str, terms: &[String]) -> Result<Vec<Entry>, RepoError> {
        self.fetch_matching(site, terms).await
    }

    async fn put(&self, site: &str, entry: &Entry) -> Result<(), RepoError> {
        self.upsert_entry(site, entry).await
    }

    async fn delete(&self, site: &str, id: Uuid) -> Result<bool, RepoError> {
        self.remove_entry(site, id).await
    }
}
