//! Postgres-backed repository implementations.

mod audit;
mod entries;
mod schema;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::RepoError;

/// Listing key: publication date, falling back to creation time.
const ENTRIES_PRIMARY_TIME_EXPR: &str = "COALESCE(e.entry_date, e.created_at)";

const ENTRY_COLUMNS: &str = "e.id, e.slug, e.title, e.description, e.body, e.thumbnail, \
     e.cover, e.tags, e.entry_date, e.author_id, e.created_at, e.updated_at, e.deleted";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    /// Create the entry and change-log tables and their indexes.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        for statement in schema::STATEMENTS {
            query(statement)
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(())
    }

    /// Round-trip a trivial query so an unreachable server fails before any DDL runs.
    pub async fn health_check(&self) -> Result<(), RepoError> {
        query("SELECT 1")
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    /// `SELECT <entry columns> FROM entries e WHERE e.site = $site`
    fn select_entries<'q>(site: &'q str) -> QueryBuilder<'q, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(ENTRY_COLUMNS);
        qb.push(" FROM entries e WHERE e.site = ");
        qb.push_bind(site);
        qb
    }

    fn push_live_filter(qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" AND NOT e.deleted");
    }

    fn push_newest_first(qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" ORDER BY ");
        qb.push(ENTRIES_PRIMARY_TIME_EXPR);
        qb.push(" DESC, e.id DESC");
    }

    fn push_limit(qb: &mut QueryBuilder<'_, Postgres>, limit: usize) -> Result<(), RepoError> {
        let limit = i64::try_from(limit).map_err(|_| RepoError::InvalidInput {
            message: format!("limit {limit} exceeds supported range"),
        })?;
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        Ok(())
    }
}
