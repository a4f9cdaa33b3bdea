use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{ChangeBatch, ChangeLogRepo, RepoError},
    domain::entities::ChangeLogRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ChangeLogRow {
    id: Uuid,
    site: String,
    entity_id: Uuid,
    person_id: String,
    display_name: String,
    field: String,
    old_value: String,
    new_value: String,
    created_at: OffsetDateTime,
}

impl From<ChangeLogRow> for ChangeLogRecord {
    fn from(row: ChangeLogRow) -> Self {
        Self {
            id: row.id,
            site: row.site,
            entity_id: row.entity_id,
            person_id: row.person_id,
            display_name: row.display_name,
            field: row.field,
            old_value: row.old_value,
            new_value: row.new_value,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ChangeLogRepo for PostgresRepositories {
    /// One multi-row insert per batch.
    async fn append_batch(&self, site: &str, batch: ChangeBatch) -> Result<(), RepoError> {
        let records = batch.into_records(site);
        if records.is_empty() {
            return Ok(());
        }

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO entry_change_log \
             (id, site, entity_id, person_id, display_name, field, old_value, new_value, created_at) ",
        );
        qb.push_values(records, |mut row, record| {
            row.push_bind(record.id)
                .push_bind(record.site)
                .push_bind(record.entity_id)
                .push_bind(record.person_id)
                .push_bind(record.display_name)
                .push_bind(record.field)
                .push_bind(record.old_value)
                .push_bind(record.new_value)
                .push_bind(record.created_at);
        });

        qb.build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_for_entity(
        &self,
        site: &str,
        entity_id: Uuid,
    ) -> Result<Vec<ChangeLogRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ChangeLogRow>(
            r#"
            SELECT id, site, entity_id, person_id, display_name, field, old_value, new_value,
                   created_at
            FROM entry_change_log
            WHERE site = $1 AND entity_id = $2
            ORDER BY created_at, seq
            "#,
        )
        .bind(site)
        .bind(entity_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ChangeLogRecord::from).collect())
    }
}
