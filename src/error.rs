use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failures touching the persisted configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no application data directory could be resolved")]
    NoAppDataDir,

    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Network or parse failures while retrieving a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot parse feed from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },
}

/// A single invocation of the external executable went wrong.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} finished with {status}")]
    Exit { program: String, status: ExitStatus },
}

/// Rejected user actions on the application state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("a play cycle is already running")]
    AlreadyPlaying,

    #[error("no feed is selected")]
    NoFeedSelected,

    #[error("feed name must not be empty")]
    EmptyName,

    #[error("feed URL must not be empty")]
    EmptyUrl,

    #[error("a feed named '{0}' already exists")]
    DuplicateName(String),
}
