use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::FetchError;

const USER_AGENT: &str = "VroidRSS/0.1 (feed reader)";

/// One feed entry reduced to what the player reads aloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    /// Retrieve and parse the feed at `url`, preserving item order.
    pub async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>, FetchError> {
        info!("Fetching feed: {}", url);

        let request_err = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(request_err)?;
        let bytes = response.bytes().await.map_err(request_err)?;

        let items = parse_items(&bytes).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })?;

        info!("Fetched {} items from {}", items.len(), url);
        Ok(items)
    }
}

/// Parse an RSS or Atom document into its items.
pub fn parse_items(bytes: &[u8]) -> Result<Vec<FeedItem>, parser::ParseFeedError> {
    let parsed = parser::parse(bytes)?;
    debug!("Parsed feed with {} entries", parsed.entries.len());

    Ok(parsed.entries.iter().map(to_item).collect())
}

fn to_item(entry: &Entry) -> FeedItem {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .unwrap_or_default();

    // RSS <description> and Atom <summary> both land in `summary`
    let description = entry
        .summary
        .as_ref()
        .map(|t| t.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .unwrap_or_default();

    FeedItem { title, description }
}
