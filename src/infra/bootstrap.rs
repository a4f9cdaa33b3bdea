//! Backend selection and store assembly.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::audit::ChangeLogService;
use crate::application::entries::EntryService;
use crate::application::repos::{ChangeLogRepo, EntryStore, PersonDirectory};
use crate::cache::{CacheConfig, EntryCache};
use crate::config::{BackendKind, Settings, StoreSettings};

use super::db::PostgresRepositories;
use super::docstore::MongoEntryStore;
use super::error::InfraError;
use super::memory::{MemoryChangeLog, MemoryEntryStore};

/// Entry storage and its change log, backed by the same engine.
#[derive(Clone)]
pub struct Backends {
    pub entries: Arc<dyn EntryStore>,
    pub change_log: Arc<dyn ChangeLogRepo>,
}

/// Connect to the configured backend and make sure its schema exists. A
/// schema failure aborts startup.
pub async fn open_backends(settings: &StoreSettings) -> Result<Backends, InfraError> {
    let backends = match settings.backend {
        BackendKind::Postgres => {
            let url = require_url(settings)?;
            let pool = PostgresRepositories::connect(url, settings.max_connections.get())
                .await
                .map_err(|err| InfraError::database(err.to_string()))?;
            let repositories = Arc::new(PostgresRepositories::new(pool));
            Backends {
                entries: repositories.clone(),
                change_log: repositories,
            }
        }
        BackendKind::Document => {
            let url = require_url(settings)?;
            let store = MongoEntryStore::connect(url, &settings.database)
                .await
                .map_err(|err| InfraError::document_store(err.to_string()))?;
            let store = Arc::new(store);
            Backends {
                entries: store.clone(),
                change_log: store,
            }
        }
        BackendKind::Memory => {
            warn!("memory backend selected; entries are dropped when the process exits");
            Backends {
                entries: Arc::new(MemoryEntryStore::new()),
                change_log: Arc::new(MemoryChangeLog::new()),
            }
        }
    };

    backends
        .entries
        .ensure_schema()
        .await
        .map_err(|err| InfraError::schema(settings.backend.as_str(), err))?;

    info!(backend = settings.backend.as_str(), "entry store ready");
    Ok(backends)
}

/// Assemble the facade over already opened backends.
pub fn build_service(
    backends: Backends,
    settings: &Settings,
    people: Arc<dyn PersonDirectory>,
) -> EntryService {
    let cache = EntryCache::new(&CacheConfig::from(&settings.cache));
    EntryService::new(
        backends.entries,
        Arc::new(cache),
        people,
        ChangeLogService::new(backends.change_log),
    )
}

pub async fn open_store(
    settings: &Settings,
    people: Arc<dyn PersonDirectory>,
) -> Result<EntryService, InfraError> {
    let backends = open_backends(&settings.store).await?;
    Ok(build_service(backends, settings, people))
}

fn require_url(settings: &StoreSettings) -> Result<&str, InfraError> {
    settings.url.as_deref().ok_or_else(|| {
        InfraError::configuration(format!(
            "store.url is not configured for the `{}` backend",
            settings.backend.as_str()
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use crate::domain::entities::Entry;

    use super::*;

    fn memory_settings() -> StoreSettings {
        StoreSettings {
            backend: BackendKind::Memory,
            url: None,
            database: "entrystore".to_string(),
            max_connections: NonZeroU32::MIN,
        }
    }

    #[tokio::test]
    async fn memory_backends_do_not_outlive_their_handle() {
        let first = open_backends(&memory_settings()).await.expect("memory opens");
        let mut entry = Entry::new();
        entry.set_title("Transient");
        entry.set_body("Gone on restart");
        let id = entry.ensure_id();
        first.entries.put("site", &entry).await.expect("put");
        assert!(first.entries.find_by_id("site", id).await.expect("lookup").is_some());

        let reopened = open_backends(&memory_settings()).await.expect("memory opens");
        assert!(reopened.entries.find_by_id("site", id).await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn remote_backends_require_a_url() {
        let settings = StoreSettings {
            backend: BackendKind::Postgres,
            ..memory_settings()
        };
        assert!(matches!(
            open_backends(&settings).await,
            Err(InfraError::Configuration { .. })
        ));
    }
}
