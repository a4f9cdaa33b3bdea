use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use uuid::Uuid;

use crate::application::repos::{ChangeBatch, ChangeLogRepo, RepoError};
use crate::domain::entities::ChangeLogRecord;

use super::types::ChangeDocument;
use super::{MongoEntryStore, map_mongo_error};

#[async_trait]
impl ChangeLogRepo for MongoEntryStore {
    async fn append_batch(&self, site: &str, batch: ChangeBatch) -> Result<(), RepoError> {
        let documents: Vec<ChangeDocument> = batch
            .into_records(site)
            .iter()
            .enumerate()
            .map(|(seq, record)| ChangeDocument::from_record(record, seq))
            .collect();
        if documents.is_empty() {
            return Ok(());
        }

        self.change_log(site)
            .await?
            .insert_many(documents)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn list_for_entity(
        &self,
        site: &str,
        entity_id: Uuid,
    ) -> Result<Vec<ChangeLogRecord>, RepoError> {
        let documents: Vec<ChangeDocument> = self
            .change_log(site)
            .await?
            .find(doc! { "entity_id": entity_id.to_string() })
            .sort(doc! { "recorded_nanos": 1, "seq": 1 })
            .await
            .map_err(map_mongo_error)?
            .try_collect()
            .await
            .map_err(map_mongo_error)?;

        documents
            .into_iter()
            .map(|document| document.into_record(site))
            .collect()
    }
}
