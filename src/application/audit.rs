use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{ChangeBatch, ChangeLogRepo, RepoError};
use crate::application::session::Session;
use crate::domain::entities::{ChangeLogRecord, FieldChange};

/// Thin wrapper around the change-log repository that stamps each batch with
/// the acting person.
#[derive(Clone)]
pub struct ChangeLogService {
    repo: Arc<dyn ChangeLogRepo>,
}

impl ChangeLogService {
    pub fn new(repo: Arc<dyn ChangeLogRepo>) -> Self {
        Self { repo }
    }

    pub async fn record(
        &self,
        session: &dyn Session,
        entity_id: Uuid,
        changes: Vec<FieldChange>,
    ) -> Result<(), RepoError> {
        if changes.is_empty() {
            return Ok(());
        }

        let batch = ChangeBatch {
            entity_id,
            person_id: session.person_id().unwrap_or_default().to_string(),
            display_name: session.display_name().to_string(),
            recorded_at: OffsetDateTime::now_utc(),
            changes,
        };

        self.repo.append_batch(session.site(), batch).await
    }

    pub async fn history(
        &self,
        site: &str,
        entity_id: Uuid,
    ) -> Result<Vec<ChangeLogRecord>, RepoError> {
        self.repo.list_for_entity(site, entity_id).await
    }
}
