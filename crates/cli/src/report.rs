use serde::Serialize;
use sift_core::{BatchEvent, BatchSummary, Catalog, FinishReason};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    Running,
    Completed,
    Cancelled,
    Aborted,
    NothingToClassify,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub phrase: String,
    pub outcome: ReportOutcome,
    pub summary: BatchSummary,
    pub error: Option<String>,
    pub dropped: Vec<PathBuf>,
    pub skipped: Vec<SkippedItem>,
    pub remaining: Vec<PathBuf>,
}

impl BatchReport {
    pub fn new(phrase: &str) -> Self {
        Self {
            phrase: phrase.to_string(),
            outcome: ReportOutcome::Running,
            summary: BatchSummary::default(),
            error: None,
            dropped: Vec::new(),
            skipped: Vec::new(),
            remaining: Vec::new(),
        }
    }

    pub fn record(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Kept { .. } => {}
            BatchEvent::Dropped { path, .. } => self.dropped.push(path),
            BatchEvent::Skipped { path, error, .. } => self.skipped.push(SkippedItem {
                path,
                reason: error.to_string(),
            }),
            BatchEvent::Finished { reason, summary } => {
                self.summary = summary;
                self.outcome = match reason {
                    FinishReason::Exhausted => ReportOutcome::Completed,
                    FinishReason::Cancelled => ReportOutcome::Cancelled,
                };
            }
            BatchEvent::Aborted { error, summary, .. } => {
                self.summary = summary;
                self.outcome = ReportOutcome::Aborted;
                self.error = Some(error.to_string());
            }
        }
    }

    pub fn set_remaining(&mut self, catalog: &Catalog) {
        self.remaining = catalog.items().iter().map(|i| i.path.clone()).collect();
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Errors when the batch was aborted, so the process exits non-zero.
    pub fn ensure_not_aborted(&self) -> anyhow::Result<()> {
        if self.outcome == ReportOutcome::Aborted {
            anyhow::bail!(
                "batch aborted: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let outcome = match self.outcome {
            ReportOutcome::Running => "still running",
            ReportOutcome::Completed => "completed",
            ReportOutcome::Cancelled => "cancelled",
            ReportOutcome::Aborted => "aborted",
            ReportOutcome::NothingToClassify => "no images to classify",
        };
        let _ = writeln!(out, "Search {:?}: {}", self.phrase, outcome);
        if let Some(err) = &self.error {
            let _ = writeln!(out, "Error: {err}");
        }
        let _ = writeln!(
            out,
            "{} classified, {} dropped, {} skipped, {} remaining",
            self.summary.classified,
            self.summary.dropped,
            self.summary.skipped,
            self.remaining.len()
        );
        for path in &self.remaining {
            let _ = writeln!(out, "  keep  {}", path.display());
        }
        for path in &self.dropped {
            let _ = writeln!(out, "  drop  {}", path.display());
        }
        for item in &self.skipped {
            let _ = writeln!(out, "  skip  {} ({})", item.path.display(), item.reason);
        }
        out
    }
}

/// One line per catalog item, marking which ones would be classified.
pub fn catalog_listing(catalog: &Catalog) -> String {
    let mut out = String::new();
    for (idx, item) in catalog.items().iter().enumerate() {
        let marker = if catalog.selected() == Some(idx) { '>' } else { ' ' };
        let kind = if item.is_eligible() { "image" } else { "-    " };
        let _ = writeln!(out, "{marker}{idx:>5}  {kind}  {}", item.path.display());
    }
    out
}
