//! VroidRSS - reads RSS feeds aloud through an external executable
//!
//! A feed is picked from a persisted list, fetched, and each item's title
//! and description are handed to the configured executable one after the
//! other with fixed pauses in between.

pub mod app;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod player;
#[cfg(feature = "gui")]
pub mod ui;
