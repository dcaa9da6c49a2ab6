//! Error type for repository operations that enforce domain rules inside a
//! transaction.

use mibeko_core::error::CoreError;

/// Either a domain rule rejected the operation or the database failed.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
