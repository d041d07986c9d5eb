// src/services/feed.rs

//! Release feed fetching.
//!
//! Feeds are fetched over HTTP and parsed with `feed-rs`, which accepts
//! Atom, RSS and JSON Feed documents alike.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FeedItem;

/// Source of feed documents.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url` into its items, in document order.
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>>;
}

/// Feed source backed by an HTTP client.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::feed(url, format!("unexpected status {status}")));
        }

        let body = response.bytes().await?;
        parse_feed(url, &body)
    }
}

/// Parse a feed document into items.
pub fn parse_feed(url: &str, body: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = feed_rs::parser::parse(body).map_err(|e| AppError::feed(url, e))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone())
                .unwrap_or_default();

            FeedItem {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                link,
                published: entry.published,
                updated: entry.updated,
            }
        })
        .collect())
}
