//! Core library: catalog loading, the classification dispatcher and the
//! batch controller that filters a catalog by a search phrase.

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod mailbox;
pub mod models;
pub mod scanner;
pub mod verdict;

pub use catalog::Catalog;
pub use controller::{BatchController, BatchEvent, BatchSummary, FinishReason, StartOutcome};
pub use models::CandidateItem;
pub use verdict::Verdict;
