use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::models::normalize_title;
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Deserialize)]
struct FeedEntry {
    title: String,
}

/// Fetches the scraped catalog feed and returns its normalized titles.
pub fn fetch_titles(source_url: &str) -> SyncResult<Vec<String>> {
    let response = Client::new().get(source_url).send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::RemoteUnavailable(format!(
            "title feed returned HTTP {status}"
        )));
    }

    parse_feed(&response.text()?)
}

fn parse_feed(body: &str) -> SyncResult<Vec<String>> {
    let entries: Vec<FeedEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .map(|entry| normalize_title(&entry.title))
        .filter(|title| !title.is_empty())
        .collect())
}
