//! Sequential playback of feed items through an external executable.
//!
//! For every item the player logs the title and the indented description,
//! then launches the executable with the title, waits, launches it with the
//! description and waits again. A failed launch is logged and skipped; it
//! never aborts the loop.

use std::future::Future;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::{FetchError, ProcessError};
use crate::fetcher::FeedItem;

/// Runs the configured executable with a single argument.
pub trait Launcher: Send + Sync + 'static {
    fn launch(
        &self,
        program: &str,
        arg: &str,
    ) -> impl Future<Output = Result<(), ProcessError>> + Send;
}

/// Spawns a real child process and waits for it to exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    async fn launch(&self, program: &str, arg: &str) -> Result<(), ProcessError> {
        let status = Command::new(program)
            .arg(arg)
            .status()
            .await
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::Exit {
                program: program.to_string(),
                status,
            })
        }
    }
}

/// Pauses after each invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub after_title: Duration,
    pub after_description: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_title: Duration::from_secs(2),
            after_description: Duration::from_secs(5),
        }
    }
}

/// Messages sent from a running play cycle to the UI.
#[derive(Debug)]
pub enum PlayEvent {
    Log(String),
    Finished(Result<PlaySummary, FetchError>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaySummary {
    pub items: usize,
    pub invocations: usize,
    pub failures: usize,
}

pub struct Player<L> {
    launcher: L,
    pacing: Pacing,
}

impl<L: Launcher> Player<L> {
    pub fn new(launcher: L, pacing: Pacing) -> Self {
        Self { launcher, pacing }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Play every item in order. Log lines go to `events`.
    pub async fn play(
        &self,
        program: &str,
        items: &[FeedItem],
        events: &UnboundedSender<PlayEvent>,
    ) -> PlaySummary {
        info!("Playing {} items with {}", items.len(), program);
        let mut summary = PlaySummary {
            items: items.len(),
            ..Default::default()
        };

        for item in items {
            log_line(events, item.title.clone());
            log_line(events, format!("  {}", item.description));

            self.invoke(program, &item.title, events, &mut summary).await;
            tokio::time::sleep(self.pacing.after_title).await;

            self.invoke(program, &item.description, events, &mut summary)
                .await;
            tokio::time::sleep(self.pacing.after_description).await;
        }

        info!(
            "Play cycle complete: {} invocations, {} failures",
            summary.invocations, summary.failures
        );
        summary
    }

    async fn invoke(
        &self,
        program: &str,
        arg: &str,
        events: &UnboundedSender<PlayEvent>,
        summary: &mut PlaySummary,
    ) {
        summary.invocations += 1;
        if let Err(e) = self.launcher.launch(program, arg).await {
            warn!("Invocation {} failed: {}", summary.invocations, e);
            summary.failures += 1;
            log_line(events, format!("execute fail {}.", e));
        }
    }
}

fn log_line(events: &UnboundedSender<PlayEvent>, line: String) {
    // The receiver may be gone if the window closed mid-cycle
    if events.send(PlayEvent::Log(line)).is_err() {
        debug!("Log receiver dropped");
    }
}
