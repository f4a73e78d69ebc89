use crate::{ClassificationRequest, ProviderError, RawResponse, VisionProvider};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// OpenAI-compatible chat-completions endpoint accepting image parts.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full endpoint URL, e.g. `http://localhost:9090/v1/chat/completions`.
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

impl OpenAiProvider {
    pub fn new(cfg: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    fn chat_body<'a>(&'a self, request: &'a ClassificationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&self.cfg.system_prompt),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: &request.prompt,
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: request.image.data_url(),
                            },
                        },
                    ]),
                },
            ],
            temperature: request.temperature,
        }
    }

    fn map_transport(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.cfg.timeout)
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl VisionProvider for OpenAiProvider {
    async fn execute(&self, request: &ClassificationRequest) -> Result<RawResponse, ProviderError> {
        let mut builder = self.client.post(&self.cfg.url).json(&self.chat_body(request));
        if let Some(key) = &self.cfg.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "classification response");

        if !status.is_success() {
            return Err(ProviderError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(RawResponse { body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_request, EncodedImage};
    use serde_json::json;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig {
            url: "http://localhost:9090/v1/chat/completions".into(),
            api_key: None,
            model: "gpt-4-vision-preview".into(),
            system_prompt: "You are a helpful assistant.".into(),
            timeout: Duration::from_secs(1800),
            accept_invalid_certs: false,
        })
        .unwrap()
    }

    #[test]
    fn chat_body_matches_wire_contract() {
        let provider = provider();
        let request = build_request(
            "Does the image contain cat?",
            EncodedImage::from_bytes(b"foo"),
            0.0,
        );
        let body = serde_json::to_value(provider.chat_body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4-vision-preview",
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": [
                        {"type": "text", "text": "Does the image contain cat?"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,Zm9v"}}
                    ]}
                ],
                "temperature": 0.0
            })
        );
    }
}
