//! Runs one classification per submitted item on the async runtime and
//! delivers the outcome through the mailbox.

use crate::error::{BatchError, ClassifyError};
use crate::mailbox::Mailbox;
use crate::models::CandidateItem;
use providers::{build_request, encode_file, RawResponse, VisionProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Does the image contain {phrase}?";

#[derive(Debug, Clone)]
pub struct RequestSettings {
    /// `{phrase}` is replaced with the search phrase.
    pub prompt_template: String,
    pub temperature: f32,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            temperature: 0.0,
        }
    }
}

impl RequestSettings {
    pub fn prompt_for(&self, phrase: &str) -> String {
        self.prompt_template.replace("{phrase}", phrase)
    }
}

/// Result of one worker run, tagged with the file it was about.
#[derive(Debug)]
pub struct WorkerOutcome {
    pub path: PathBuf,
    pub result: Result<RawResponse, ClassifyError>,
}

pub struct Dispatcher {
    provider: Arc<dyn VisionProvider>,
    runtime: Handle,
    mailbox: Mailbox<WorkerOutcome>,
    settings: RequestSettings,
    in_flight: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn VisionProvider>, runtime: Handle, settings: RequestSettings) -> Self {
        Self {
            provider,
            runtime,
            mailbox: Mailbox::new(),
            settings,
            in_flight: None,
        }
    }

    pub fn in_flight(&self) -> Option<&Path> {
        self.in_flight.as_deref()
    }

    /// Starts classifying `item` in the background. Refuses while the
    /// previous outcome has not been taken with [`Dispatcher::poll`].
    pub fn submit(&mut self, item: &CandidateItem, phrase: &str) -> Result<(), BatchError> {
        if self.in_flight.is_some() {
            return Err(BatchError::RequestInFlight);
        }

        let path = item.path.clone();
        let prompt = self.settings.prompt_for(phrase);
        let temperature = self.settings.temperature;
        let provider = Arc::clone(&self.provider);
        let mailbox = self.mailbox.clone();
        info!("Processing image: {}", path.display());

        self.in_flight = Some(path.clone());
        // Detached: the handle is dropped and the task frees itself when done.
        self.runtime.spawn(async move {
            let worker_path = path.clone();
            let job = tokio::spawn(async move {
                classify_file(provider.as_ref(), &worker_path, &prompt, temperature).await
            });
            let result = match job.await {
                Ok(result) => result,
                Err(e) => Err(ClassifyError::Worker(e.to_string())),
            };
            debug!(path = %path.display(), ok = result.is_ok(), "worker finished");
            mailbox.post(WorkerOutcome { path, result });
        });
        Ok(())
    }

    /// Takes the finished outcome, if any. Never blocks.
    pub fn poll(&mut self) -> Option<WorkerOutcome> {
        let outcome = self.mailbox.poll()?;
        self.in_flight = None;
        Some(outcome)
    }
}

/// encode → build → execute for one file.
pub async fn classify_file(
    provider: &dyn VisionProvider,
    path: &Path,
    prompt: &str,
    temperature: f32,
) -> Result<RawResponse, ClassifyError> {
    let image = encode_file(path).await.map_err(|source| ClassifyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let request = build_request(prompt, image, temperature);
    Ok(provider.execute(&request).await?)
}
