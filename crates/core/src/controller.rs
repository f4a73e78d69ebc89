//! Sequential, cancellable batch filter over the catalog.
//!
//! The controller owns the catalog and the dispatcher, so consuming a
//! worker result and mutating the catalog happen in one `&mut self` step
//! on the control thread. Callers that share the controller across
//! threads wrap the whole thing in a single lock.

use crate::catalog::Catalog;
use crate::dispatcher::{Dispatcher, WorkerOutcome};
use crate::error::{BatchError, ClassifyError};
use crate::verdict::Verdict;
use providers::parse_completion;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct BatchSession {
    pub phrase: String,
    pub index: usize,
    pub cancel_requested: bool,
    pub summary: BatchSummary,
}

#[derive(Debug, Clone, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Running(BatchSession),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub classified: usize,
    pub dropped: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    Exhausted,
    Cancelled,
}

#[derive(Debug)]
pub enum BatchEvent {
    Kept {
        index: usize,
        path: PathBuf,
    },
    Dropped {
        index: usize,
        path: PathBuf,
    },
    /// The file could not be read; it stays in the catalog.
    Skipped {
        index: usize,
        path: PathBuf,
        error: ClassifyError,
    },
    Finished {
        reason: FinishReason,
        summary: BatchSummary,
    },
    /// Service or protocol failure. The item in flight is untouched.
    Aborted {
        path: PathBuf,
        error: ClassifyError,
        summary: BatchSummary,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Submitted { index: usize },
    NoEligibleItems,
}

pub struct BatchController {
    catalog: Catalog,
    dispatcher: Dispatcher,
    state: BatchState,
}

impl BatchController {
    pub fn new(catalog: Catalog, dispatcher: Dispatcher) -> Self {
        Self {
            catalog,
            dispatcher,
            state: BatchState::Idle,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Selection changes are allowed at any time; removal is not.
    pub fn catalog_selection(&mut self) -> CatalogSelection<'_> {
        CatalogSelection {
            catalog: &mut self.catalog,
        }
    }

    pub fn state(&self) -> &BatchState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BatchState::Running(_))
    }

    pub fn is_stopping(&self) -> bool {
        matches!(&self.state, BatchState::Running(s) if s.cancel_requested)
    }

    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            BatchState::Running(session) => Some(session.index),
            BatchState::Idle => None,
        }
    }

    pub fn phrase(&self) -> Option<&str> {
        match &self.state {
            BatchState::Running(session) => Some(&session.phrase),
            BatchState::Idle => None,
        }
    }

    /// Hands the controller a freshly loaded catalog. Only while idle.
    pub fn replace_catalog(&mut self, catalog: Catalog) -> Result<(), BatchError> {
        if self.is_active() {
            return Err(BatchError::CatalogLocked);
        }
        self.catalog = catalog;
        Ok(())
    }

    pub fn start(&mut self, phrase: &str) -> Result<StartOutcome, BatchError> {
        if self.is_active() {
            return Err(BatchError::AlreadyRunning);
        }
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(BatchError::EmptyPhrase);
        }

        let Some(index) = self.catalog.next_eligible(0) else {
            info!("No images to classify");
            return Ok(StartOutcome::NoEligibleItems);
        };
        self.submit_at(index, phrase)?;
        info!("Batch search started for {:?}", phrase);
        self.state = BatchState::Running(BatchSession {
            phrase: phrase.to_string(),
            index,
            cancel_requested: false,
            summary: BatchSummary::default(),
        });
        Ok(StartOutcome::Submitted { index })
    }

    /// Requests cancellation. The request in flight runs to completion and
    /// its result is discarded on the next tick.
    pub fn stop(&mut self) {
        if let BatchState::Running(session) = &mut self.state {
            if !session.cancel_requested {
                info!("Stop requested; waiting for the request in flight");
            }
            session.cancel_requested = true;
        }
    }

    /// Drives the batch. Call once per control-loop iteration.
    pub fn tick(&mut self) -> Vec<BatchEvent> {
        let Some(outcome) = self.dispatcher.poll() else {
            return Vec::new();
        };

        let session = match std::mem::take(&mut self.state) {
            BatchState::Running(session) => session,
            BatchState::Idle => {
                warn!("Discarding result for {} with no batch running", outcome.path.display());
                return Vec::new();
            }
        };

        if session.cancel_requested {
            info!("Batch cancelled; discarded result for {}", outcome.path.display());
            return vec![BatchEvent::Finished {
                reason: FinishReason::Cancelled,
                summary: session.summary,
            }];
        }

        self.apply(session, outcome)
    }

    fn apply(&mut self, mut session: BatchSession, outcome: WorkerOutcome) -> Vec<BatchEvent> {
        let WorkerOutcome { path, result } = outcome;
        let mut events = Vec::with_capacity(2);

        let verdict = match result.and_then(|raw| parse_completion(&raw.body).map_err(ClassifyError::from)) {
            Ok(completion) => {
                debug!(
                    "Finish reason: {}",
                    completion.finish_reason.as_deref().unwrap_or("N/A")
                );
                debug!("Assistant: {}", completion.content.as_deref().unwrap_or("N/A"));
                session.summary.classified += 1;
                Some(Verdict::from_answer(completion.content_or_empty()))
            }
            Err(error) if error.is_local() => {
                warn!("Skipping {}: {}", path.display(), error);
                session.summary.skipped += 1;
                events.push(BatchEvent::Skipped {
                    index: session.index,
                    path: path.clone(),
                    error,
                });
                None
            }
            Err(error) => {
                error!("Batch aborted at {}: {}", path.display(), error);
                return vec![BatchEvent::Aborted {
                    path,
                    error,
                    summary: session.summary,
                }];
            }
        };

        match verdict {
            Some(Verdict::Drop) => {
                self.catalog.remove(session.index);
                session.summary.dropped += 1;
                info!("Dropped {}", path.display());
                events.push(BatchEvent::Dropped {
                    index: session.index,
                    path,
                });
            }
            Some(Verdict::Keep) => {
                debug!("Kept {}", path.display());
                events.push(BatchEvent::Kept {
                    index: session.index,
                    path,
                });
                session.index += 1;
            }
            None => session.index += 1,
        }

        let Some(next) = self.catalog.next_eligible(session.index) else {
            info!(
                "Batch finished: {} classified, {} dropped, {} skipped",
                session.summary.classified, session.summary.dropped, session.summary.skipped
            );
            events.push(BatchEvent::Finished {
                reason: FinishReason::Exhausted,
                summary: session.summary,
            });
            return events;
        };

        session.index = next;
        if let Err(e) = self.submit_at(next, &session.phrase) {
            // Unreachable while the mailbox was just drained; end cleanly anyway.
            error!("Could not submit next item: {}", e);
            events.push(BatchEvent::Finished {
                reason: FinishReason::Cancelled,
                summary: session.summary,
            });
            return events;
        }
        self.state = BatchState::Running(session);
        events
    }

    fn submit_at(&mut self, index: usize, phrase: &str) -> Result<(), BatchError> {
        match self.catalog.get(index) {
            Some(item) => self.dispatcher.submit(item, phrase),
            None => Ok(()),
        }
    }
}

/// Selection-only view of the controller's catalog.
pub struct CatalogSelection<'a> {
    catalog: &'a mut Catalog,
}

impl CatalogSelection<'_> {
    pub fn select(&mut self, index: usize) -> bool {
        self.catalog.select(index)
    }

    pub fn clear(&mut self) {
        self.catalog.clear_selection();
    }
}
