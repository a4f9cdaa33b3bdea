use std::error::Error as StdError;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Failures surfaced by the entry store facade.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session does not identify a site")]
    InvalidSession,
    #[error("operation requires an authenticated session")]
    Unauthenticated,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("entry `{id}` not found")]
    NotFound { id: Uuid },
    #[error("failed to record change log: {0}")]
    Audit(#[source] RepoError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl StoreError {
    pub fn not_found(id: Option<Uuid>) -> Self {
        Self::NotFound {
            id: id.unwrap_or_else(Uuid::nil),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::NotFound | AppError::Store(StoreError::NotFound { .. }) => 2,
            AppError::Validation(_)
            | AppError::Domain(_)
            | AppError::Store(StoreError::Domain(_))
            | AppError::Store(StoreError::InvalidSession)
            | AppError::Store(StoreError::Unauthenticated) => 3,
            AppError::Infra(InfraError::Database { .. })
            | AppError::Store(StoreError::Repo(RepoError::Timeout)) => 4,
            _ => 1,
        }
    }
}

/// The chain of messages behind an error, outermost first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}
