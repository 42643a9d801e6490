use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a movie by TMDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bearer token for the user's TMDB account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(alias = "accessToken")]
    pub token: String,
}

/// Trims the title and unescapes `\'` sequences left over by the scraper.
pub fn normalize_title(title: &str) -> String {
    title.trim().replace("\\'", "'")
}
