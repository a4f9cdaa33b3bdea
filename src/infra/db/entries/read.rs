use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::Entry;
use crate::domain::search::SEARCH_LIMIT;

use super::super::{PostgresRepositories, map_sqlx_error};
use super::types::EntryRow;

impl PostgresRepositories {
    pub(super) async fn fetch_by_id(
        &self,
        site: &str,
        id: Uuid,
    ) -> Result<Option<Entry>, RepoError> {
        let mut qb = Self::select_entries(site);
        qb.push(" AND e.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<EntryRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Entry::from))
    }

    pub(super) async fn fetch_by_slug(
        &self,
        site: &str,
        slug: &str,
    ) -> Result<Option<Entry>, RepoError> {
        let mut qb = Self::select_entries(site);
        qb.push(" AND e.slug = ");
        qb.push_bind(slug);

        let row = qb
            .build_query_as::<EntryRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Entry::from))
    }

    pub(super) async fn fetch_all(&self, site: &str) -> Result<Vec<Entry>, RepoError> {
        let mut qb = Self::select_entries(site);
        Self::push_newest_first(&mut qb);
        self.fetch_list(qb).await
    }

    pub(super) async fn fetch_recent(
        &self,
        site: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut qb = Self::select_entries(site);
        Self::push_live_filter(&mut qb);
        qb.push(" AND e.entry_date < ");
        qb.push_bind(now);
        Self::push_newest_first(&mut qb);
        Self::push_limit(&mut qb, limit)?;
        self.fetch_list(qb).await
    }

    pub(super) async fn fetch_future(
        &self,
        site: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut qb = Self::select_entries(site);
        Self::push_live_filter(&mut qb);
        qb.push(" AND e.entry_date > ");
        qb.push_bind(now);
        Self::push_newest_first(&mut qb);
        self.fetch_list(qb).await
    }

    pub(super) async fn fetch_by_author(
        &self,
        site: &str,
        author_id: &str,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut qb = Self::select_entries(site);
        Self::push_live_filter(&mut qb);
        qb.push(" AND e.author_id = ");
        qb.push_bind(author_id);
        Self::push_newest_first(&mut qb);
        self.fetch_list(qb).await
    }

    pub(super) async fn fetch_by_tag(
        &self,
        site: &str,
        tag_key: &str,
        now: OffsetDateTime,
        limit: usize,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut qb = Self::select_entries(site);
        Self::push_live_filter(&mut qb);
        qb.push(" AND e.search_tags @> ");
        qb.push_bind(vec![tag_key.to_string()]);
        qb.push(" AND e.entry_date < ");
        qb.push_bind(now);
        Self::push_newest_first(&mut qb);
        Self::push_limit(&mut qb, limit)?;
        self.fetch_list(qb).await
    }

    /// Every term must be present; the GIN index on `search_tags` serves the
    /// containment check.
    pub(super) async fn fetch_matching(
        &self,
        site: &str,
        terms: &[String],
    ) -> Result<Vec<Entry>, RepoError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = Self::select_entries(site);
        Self::push_live_filter(&mut qb);
        qb.push(" AND e.search_tags @> ");
        qb.push_bind(terms.to_vec());
        Self::push_newest_first(&mut qb);
        Self::push_limit(&mut qb, SEARCH_LIMIT)?;
        self.fetch_list(qb).await
    }

    async fn fetch_list(
        &self,
        mut qb: sqlx::QueryBuilder<'_, sqlx::Postgres>,
    ) -> Result<Vec<Entry>, RepoError> {
        let rows = qb
            .build_query_as::<EntryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Entry::from).collect())
    }
}
