//! Wires configuration into providers, the dispatcher and the controller.

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::controller::BatchController;
use crate::dispatcher::{Dispatcher, RequestSettings};
use crate::scanner::ScanOptions;
use anyhow::Context;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

pub fn build_registry(config: &AppConfig) -> anyhow::Result<ProviderRegistry> {
    let service = &config.service;
    let openai = OpenAiProvider::new(OpenAiConfig {
        url: service.url.clone(),
        api_key: service.api_key.clone(),
        model: service.model.clone(),
        system_prompt: service.system_prompt.clone(),
        timeout: Duration::from_secs(service.timeout_secs),
        accept_invalid_certs: service.accept_invalid_certs,
    })
    .context("building HTTP client")?;

    Ok(ProviderRegistry::new()
        .with_provider("noop", Arc::new(NoopProvider))
        .with_provider("openai", Arc::new(openai))
        .set_preferred(&service.provider))
}

pub fn request_settings(config: &AppConfig) -> RequestSettings {
    RequestSettings {
        prompt_template: config.batch.prompt_template.clone(),
        temperature: config.batch.temperature,
    }
}

pub fn scan_options(config: &AppConfig) -> ScanOptions {
    ScanOptions {
        recursive: config.scan.recursive,
        include_hidden: config.scan.include_hidden,
        exclude: config.scan.exclude.clone(),
    }
}

/// Controller backed by the configured provider, running workers on `runtime`.
pub fn build_controller(
    config: &AppConfig,
    catalog: Catalog,
    runtime: Handle,
) -> anyhow::Result<BatchController> {
    let registry = build_registry(config)?;
    let provider = registry
        .provider(None)
        .with_context(|| format!("available providers: {}", registry.names().join(", ")))?;
    let dispatcher = Dispatcher::new(provider, runtime, request_settings(config));
    Ok(BatchController::new(catalog, dispatcher))
}
