use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

use crate::config::{Config, ConfigStore, Rss};
use crate::error::{AppError, ConfigError, FetchError};
use crate::fetcher::Fetcher;
use crate::player::{Launcher, Pacing, PlayEvent, PlaySummary, Player, ProcessLauncher};

/// Everything the window reads and mutates, owned in one place.
pub struct AppState<L: Launcher = ProcessLauncher> {
    store: ConfigStore,
    config: Config,
    selected: usize,
    executable_path: String,
    log: Vec<String>,
    session: Option<PlaySession>,
    runtime: Handle,
    fetcher: Arc<Fetcher>,
    player: Arc<Player<L>>,
}

/// The single in-flight play cycle.
struct PlaySession {
    feed: String,
    events: UnboundedReceiver<PlayEvent>,
}

impl AppState<ProcessLauncher> {
    pub fn new(store: ConfigStore, config: Config, runtime: Handle) -> Result<Self, FetchError> {
        let player = Player::new(ProcessLauncher, Pacing::default());
        Self::with_player(store, config, runtime, player)
    }
}

impl<L: Launcher> AppState<L> {
    pub fn with_player(
        store: ConfigStore,
        config: Config,
        runtime: Handle,
        player: Player<L>,
    ) -> Result<Self, FetchError> {
        let executable_path = config.vrx.path.clone();
        Ok(Self {
            store,
            config,
            selected: 0,
            executable_path,
            log: Vec::new(),
            session: None,
            runtime,
            fetcher: Arc::new(Fetcher::new()?),
            player: Arc::new(player),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn feeds(&self) -> &[Rss] {
        &self.config.rss
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_feed(&self) -> Option<&Rss> {
        self.config.rss.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.config.rss.len() {
            self.selected = index;
        }
    }

    /// URL bound to a display name. Later entries shadow earlier ones.
    pub fn resolve_url(&self, name: &str) -> Option<&str> {
        self.config
            .rss
            .iter()
            .rev()
            .find(|r| r.name == name)
            .map(|r| r.url.as_str())
    }

    /// Append a feed and make it the selected entry.
    pub fn add_feed(&mut self, name: &str, url: &str) -> Result<usize, AppError> {
        let name = name.trim();
        let url = url.trim();
        if name.is_empty() {
            return Err(AppError::EmptyName);
        }
        if url.is_empty() {
            return Err(AppError::EmptyUrl);
        }
        if self.config.rss.iter().any(|r| r.name == name) {
            return Err(AppError::DuplicateName(name.to_string()));
        }

        self.config.rss.push(Rss::new(name, url));
        self.selected = self.config.rss.len() - 1;
        info!("Added feed '{}' ({})", name, url);
        Ok(self.selected)
    }

    pub fn executable_path(&self) -> &str {
        &self.executable_path
    }

    /// Text bound to the path field. Edits reach the config on save.
    pub fn executable_path_mut(&mut self) -> &mut String {
        &mut self.executable_path
    }

    /// Path chosen through the file picker; applies immediately.
    pub fn set_executable_path(&mut self, path: impl Into<String>) {
        self.executable_path = path.into();
        self.config.vrx.path = self.executable_path.clone();
    }

    pub fn save(&mut self) -> Result<(), ConfigError> {
        self.config.vrx.path = self.executable_path.clone();
        self.store.save(&self.config)?;
        info!("Saved {} feeds to {}", self.config.rss.len(), self.store.file().display());
        Ok(())
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn log_text(&self) -> String {
        self.log.join("\n")
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Fetch the selected feed and play it on the runtime.
    ///
    /// The executable path is read once here; later edits apply to the
    /// next cycle only.
    pub fn start_play(&mut self) -> Result<(), AppError> {
        if self.session.is_some() {
            return Err(AppError::AlreadyPlaying);
        }
        let feed = self.selected_feed().ok_or(AppError::NoFeedSelected)?;
        let name = feed.name.clone();
        let url = self.resolve_url(&name).unwrap_or(&feed.url).to_string();
        let program = self.config.vrx.path.clone();

        let (tx, rx) = mpsc::unbounded_channel();
        let fetcher = Arc::clone(&self.fetcher);
        let player = Arc::clone(&self.player);

        info!("Starting play cycle for '{}'", name);
        self.runtime.spawn(async move {
            let result = run_cycle(&fetcher, &player, &url, &program, &tx).await;
            let _ = tx.send(PlayEvent::Finished(result));
        });

        self.session = Some(PlaySession { feed: name, events: rx });
        Ok(())
    }

    /// Move pending log lines into the log. Returns whether a cycle is
    /// still running.
    pub fn poll(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let finished = loop {
            match session.events.try_recv() {
                Ok(PlayEvent::Log(line)) => self.log.push(line),
                Ok(PlayEvent::Finished(result)) => break Some(result),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => break None,
            }
        };

        let feed = session.feed.clone();
        self.session = None;
        match finished {
            Some(Ok(summary)) => info!(
                "Finished '{}': {} items, {} failed invocations",
                feed, summary.items, summary.failures
            ),
            Some(Err(e)) => {
                error!("Play cycle for '{}' aborted: {}", feed, e);
                self.log.push(format!("fetch fail {}.", e));
            }
            None => error!("Play task for '{}' stopped without reporting", feed),
        }
        false
    }
}

/// Fetch then play. Nothing is launched if the fetch fails.
pub async fn run_cycle<L: Launcher>(
    fetcher: &Fetcher,
    player: &Player<L>,
    url: &str,
    program: &str,
    events: &UnboundedSender<PlayEvent>,
) -> Result<PlaySummary, FetchError> {
    let items = fetcher.fetch(url).await?;
    Ok(player.play(program, &items, events).await)
}
