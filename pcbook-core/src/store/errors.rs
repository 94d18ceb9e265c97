/*
    errors.rs - Error types for the store subsystem

    Lookups that miss are not errors: `find` returns `Ok(None)`.
*/

use thiserror::Error;

use crate::context::ContextError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An entry with the same key is already stored
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// The caller's context was canceled or hit its deadline mid-operation
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
