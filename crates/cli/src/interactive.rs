//! Line-oriented control surface: reads commands while the controller
//! keeps ticking, so a batch can be watched and stopped from the prompt.

use crate::report::catalog_listing;
use anyhow::Result;
use sift_core::scanner::{load_catalog, ScanOptions};
use sift_core::{BatchController, BatchEvent, Catalog, FinishReason, StartOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub const HELP: &str = "commands: load <dir> | search <phrase> | stop | status | list | select <n> | quit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Search(String),
    Stop,
    Status,
    List,
    Select(usize),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        let cmd = match word {
            "load" if !rest.is_empty() => Command::Load(PathBuf::from(rest)),
            "search" if !rest.is_empty() => Command::Search(rest.to_string()),
            "stop" => Command::Stop,
            "status" => Command::Status,
            "list" => Command::List,
            "select" => Command::Select(
                rest.parse()
                    .map_err(|_| format!("select needs an index, got {rest:?}"))?,
            ),
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(format!("unrecognised command {line:?}; {HELP}")),
        };
        Ok(Some(cmd))
    }
}

pub struct Session<W> {
    controller: BatchController,
    scan: ScanOptions,
    out: W,
    pending_load: Option<JoinHandle<Result<Catalog>>>,
}

impl<W: AsyncWrite + Unpin> Session<W> {
    pub fn new(controller: BatchController, scan: ScanOptions, out: W) -> Self {
        Self {
            controller,
            scan,
            out,
            pending_load: None,
        }
    }

    pub fn controller(&self) -> &BatchController {
        &self.controller
    }

    pub fn into_parts(self) -> (BatchController, W) {
        (self.controller, self.out)
    }

    /// Processes commands from `input` until `quit` or end of input, then
    /// lets any running batch and pending load finish.
    pub async fn run<R>(&mut self, input: R, tick: Duration) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut input_open = true;
        let mut ticker = interval(tick.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if !input_open && !self.controller.is_active() && self.pending_load.is_none() {
                return Ok(());
            }
            tokio::select! {
                _ = ticker.tick() => {
                    for event in self.controller.tick() {
                        self.print_event(&event).await?;
                    }
                }
                loaded = async {
                    match self.pending_load.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if self.pending_load.is_some() => {
                    self.pending_load = None;
                    self.finish_load(loaded).await?;
                }
                line = lines.next_line(), if input_open => {
                    match line? {
                        None => input_open = false,
                        Some(line) => match Command::parse(&line) {
                            Ok(Some(Command::Quit)) => {
                                self.controller.stop();
                                input_open = false;
                            }
                            Ok(Some(cmd)) => self.handle(cmd).await?,
                            Ok(None) => {}
                            Err(msg) => self.say(&msg).await?,
                        },
                    }
                }
            }
        }
    }

    async fn handle(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Load(dir) => {
                if self.controller.is_active() {
                    return self.say("a batch is running; stop it before loading").await;
                }
                if self.pending_load.is_some() {
                    return self.say("already loading").await;
                }
                let scan = self.scan.clone();
                self.say(&format!("loading {}", dir.display())).await?;
                self.pending_load = Some(tokio::spawn(async move { load_catalog(&dir, &scan).await }));
            }
            Command::Search(phrase) => {
                if self.pending_load.is_some() {
                    return self.say("still loading").await;
                }
                match self.controller.start(&phrase) {
                    Ok(StartOutcome::Submitted { index }) => {
                        self.say(&format!("searching for {phrase:?} from item {index}")).await?
                    }
                    Ok(StartOutcome::NoEligibleItems) => self.say("no images to classify").await?,
                    Err(e) => self.say(&e.to_string()).await?,
                }
            }
            Command::Stop => {
                if self.controller.is_active() {
                    self.controller.stop();
                    self.say("stopping after the current image").await?;
                } else {
                    self.say("idle").await?;
                }
            }
            Command::Status => {
                let catalog = self.controller.catalog();
                let status = match (self.controller.phrase(), self.controller.current_index()) {
                    (Some(phrase), Some(index)) => format!(
                        "{} {phrase:?} at {index}/{}",
                        if self.controller.is_stopping() { "stopping" } else { "searching" },
                        catalog.len()
                    ),
                    _ => format!("idle; {} items, {} images", catalog.len(), catalog.eligible_count()),
                };
                self.say(&status).await?;
            }
            Command::List => {
                let listing = catalog_listing(self.controller.catalog());
                self.out.write_all(listing.as_bytes()).await?;
                self.out.flush().await?;
            }
            Command::Select(index) => {
                if self.controller.catalog_selection().select(index) {
                    let path = self.controller.catalog().get(index).map(|i| i.path.display().to_string());
                    self.say(&format!("selected {}", path.unwrap_or_default())).await?;
                } else {
                    self.say(&format!("no item {index}")).await?;
                }
            }
            Command::Help => self.say(HELP).await?,
            Command::Quit => {}
        }
        Ok(())
    }

    async fn finish_load(&mut self, loaded: Result<Result<Catalog>, tokio::task::JoinError>) -> Result<()> {
        let catalog = match loaded {
            Ok(Ok(catalog)) => catalog,
            Ok(Err(e)) => return self.say(&format!("load failed: {e:#}")).await,
            Err(e) => return self.say(&format!("load failed: {e}")).await,
        };
        let (len, images) = (catalog.len(), catalog.eligible_count());
        match self.controller.replace_catalog(catalog) {
            Ok(()) => self.say(&format!("loaded {len} items ({images} images)")).await,
            Err(e) => self.say(&e.to_string()).await,
        }
    }

    async fn print_event(&mut self, event: &BatchEvent) -> Result<()> {
        let line = match event {
            BatchEvent::Kept { index, path } => format!("keep  [{index}] {}", path.display()),
            BatchEvent::Dropped { index, path } => format!("drop  [{index}] {}", path.display()),
            BatchEvent::Skipped { index, path, error } => {
                format!("skip  [{index}] {} ({error})", path.display())
            }
            BatchEvent::Finished { reason, summary } => format!(
                "{}: {} classified, {} dropped, {} skipped",
                match reason {
                    FinishReason::Exhausted => "done",
                    FinishReason::Cancelled => "stopped",
                },
                summary.classified,
                summary.dropped,
                summary.skipped
            ),
            BatchEvent::Aborted { path, error, .. } => {
                format!("aborted at {}: {error}", path.display())
            }
        };
        self.say(&line).await
    }

    async fn say(&mut self, line: &str) -> Result<()> {
        self.out.write_all(line.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  "), Ok(None));
        assert_eq!(
            Command::parse("search a red car"),
            Ok(Some(Command::Search("a red car".into())))
        );
        assert_eq!(
            Command::parse("load /tmp/pics"),
            Ok(Some(Command::Load(PathBuf::from("/tmp/pics"))))
        );
        assert_eq!(Command::parse("select 3"), Ok(Some(Command::Select(3))));
        assert_eq!(Command::parse("exit"), Ok(Some(Command::Quit)));
        assert!(Command::parse("select x").is_err());
        assert!(Command::parse("search").is_err());
        assert!(Command::parse("dance").is_err());
    }
}
