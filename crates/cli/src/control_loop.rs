use crate::report::{BatchReport, ReportOutcome};
use sift_core::{BatchController, StartOutcome};
use std::fmt::Display;
use std::future::{self, Future};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

/// Runs one batch to the end, ticking the controller every `tick`.
/// When `cancel` resolves the controller is asked to stop; the loop keeps
/// ticking until the request in flight has been received and discarded.
pub async fn run_batch<F>(
    controller: &mut BatchController,
    phrase: &str,
    tick: Duration,
    cancel: F,
) -> anyhow::Result<BatchReport>
where
    F: Future<Output = ()>,
{
    let mut report = BatchReport::new(phrase);
    if controller.start(phrase)? == StartOutcome::NoEligibleItems {
        report.outcome = ReportOutcome::NothingToClassify;
        report.set_remaining(controller.catalog());
        return Ok(report);
    }

    tokio::pin!(cancel);
    let mut cancelled = false;
    let mut ticker = interval(tick.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while controller.is_active() {
        tokio::select! {
            _ = ticker.tick() => {
                for event in controller.tick() {
                    report.record(event);
                }
            }
            _ = &mut cancel, if !cancelled => {
                cancelled = true;
                warn!("Interrupted; finishing the request in flight");
                controller.stop();
            }
        }
    }

    report.set_remaining(controller.catalog());
    Ok(report)
}

/// Resolves when `signal` fires. A signal that cannot be listened for
/// never resolves, so the batch is not cancelled by the failure itself.
pub async fn unless_unavailable<E: Display>(signal: impl Future<Output = Result<(), E>>) {
    if let Err(e) = signal.await {
        warn!("Interrupt handler unavailable, batch cannot be interrupted: {}", e);
        future::pending::<()>().await;
    }
}
