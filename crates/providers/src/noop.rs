use crate::{ClassificationRequest, ProviderError, RawResponse, VisionProvider};

#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl VisionProvider for NoopProvider {
    async fn execute(&self, _request: &ClassificationRequest) -> Result<RawResponse, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
