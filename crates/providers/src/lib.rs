//! Provider abstractions for vision classification services.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod noop;
pub mod openai;
pub mod request;
pub mod response;

pub use request::{build_request, encode_file, ClassificationRequest, EncodedImage};
pub use response::{parse_completion, ChatCompletion};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// Undecoded response body from one classification round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub body: String,
}

/// One blocking round trip per call. Implementations never retry.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn execute(&self, request: &ClassificationRequest) -> Result<RawResponse, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn VisionProvider>>,
    pub preferred: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, name: &str, provider: Arc<dyn VisionProvider>) -> Self {
        self.providers.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred(mut self, name: &str) -> Self {
        self.preferred = Some(name.to_string());
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn provider(&self, name: Option<&str>) -> Result<Arc<dyn VisionProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no provider configured".into()))?;
        self.providers
            .get(&key)
            .cloned()
            .ok_or(ProviderError::UnknownProvider(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop::NoopProvider;

    #[test]
    fn registry_falls_back_to_preferred() {
        let reg = ProviderRegistry::new()
            .with_provider("noop", Arc::new(NoopProvider))
            .set_preferred("noop");
        assert!(reg.provider(None).is_ok());
        assert!(reg.provider(Some("noop")).is_ok());
        assert!(matches!(
            reg.provider(Some("missing")),
            Err(ProviderError::UnknownProvider(name)) if name == "missing"
        ));
    }

    #[test]
    fn registry_without_preference_is_an_error() {
        let reg = ProviderRegistry::new().with_provider("noop", Arc::new(NoopProvider));
        assert!(matches!(
            reg.provider(None),
            Err(ProviderError::UnknownProvider(_))
        ));
        assert_eq!(reg.names(), vec!["noop"]);
    }
}
