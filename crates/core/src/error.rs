use providers::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single classification produced no usable answer.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("classification worker failed: {0}")]
    Worker(String),
}

impl ClassifyError {
    /// Local failures skip the item; everything else ends the batch.
    pub fn is_local(&self) -> bool {
        matches!(self, ClassifyError::Io { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("a batch is already running")]
    AlreadyRunning,
    #[error("search phrase is empty")]
    EmptyPhrase,
    #[error("a classification request is already in flight")]
    RequestInFlight,
    #[error("catalog cannot be replaced while a batch is running")]
    CatalogLocked,
}
