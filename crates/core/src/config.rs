use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub batch: BatchConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Registry key of the provider to use ("openai" or "noop").
    pub provider: String,
    pub url: String,
    pub model: String,
    pub system_prompt: String,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub api_key: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            url: "http://localhost:9090/v1/chat/completions".to_string(),
            model: "gpt-4-vision-preview".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            timeout_secs: 1800,
            accept_invalid_certs: false,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub prompt_template: String,
    pub temperature: f32,
    pub tick_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            prompt_template: crate::dispatcher::DEFAULT_PROMPT_TEMPLATE.to_string(),
            temperature: 0.0,
            tick_ms: 16,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub recursive: bool,
    pub include_hidden: bool,
    pub exclude: Vec<String>,
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("IMAGE_SIFT").separator("__"));
    let cfg = settings.build()?;
    let mut app: AppConfig = cfg.try_deserialize()?;
    if app.service.api_key.is_none() {
        app.service.api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
    }
    Ok(app)
}
