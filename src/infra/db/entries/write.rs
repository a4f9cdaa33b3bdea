use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::entities::Entry;

use super::super::{PostgresRepositories, map_sqlx_error};

impl PostgresRepositories {
    /// Upsert keyed by `(site, id)`. `created_at` is only written on insert.
    pub(super) async fn upsert_entry(&self, site: &str, entry: &Entry) -> Result<(), RepoError> {
        let id = entry.id().ok_or_else(|| RepoError::InvalidInput {
            message: "entry has no id".to_string(),
        })?;
        let now = OffsetDateTime::now_utc();
        let created_at = entry.created().unwrap_or(now);
        let updated_at = entry.updated().unwrap_or(created_at);

        sqlx::query(
            r#"
            INSERT INTO entries (
                site, id, slug, title, description, body, thumbnail, cover,
                tags, search_tags, entry_date, author_id, created_at, updated_at, deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (site, id) DO UPDATE SET
                slug = EXCLUDED.slug,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                body = EXCLUDED.body,
                thumbnail = EXCLUDED.thumbnail,
                cover = EXCLUDED.cover,
                tags = EXCLUDED.tags,
                search_tags = EXCLUDED.search_tags,
                entry_date = EXCLUDED.entry_date,
                author_id = EXCLUDED.author_id,
                updated_at = EXCLUDED.updated_at,
                deleted = EXCLUDED.deleted
            "#,
        )
        .bind(site)
        .bind(id)
        .bind(entry.slug())
        .bind(entry.title())
        .bind(entry.description())
        .bind(entry.body())
        .bind(entry.thumbnail())
        .bind(entry.cover())
        .bind(entry.tags().to_vec())
        .bind(entry.search_tags())
        .bind(entry.date())
        .bind(entry.author_id())
        .bind(created_at)
        .bind(updated_at)
        .bind(entry.deleted())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    pub(super) async fn remove_entry(&self, site: &str, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM entries WHERE site = $1 AND id = $2")
            .bind(site)
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
