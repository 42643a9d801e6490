use reqwest::StatusCode;

pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Failures raised below the command layer.
///
/// A search that finds nothing is not an error; lookups return `Ok(None)` for that.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TMDB unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("TMDB rejected the request: {0}")]
    Rejected(String),

    #[error("Not authorized with TMDB, run the 'auth' command")]
    Unauthorized,
}

impl SyncError {
    pub fn from_status(context: &str, status: StatusCode) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            SyncError::Unauthorized
        } else {
            SyncError::RemoteUnavailable(format!("{context} failed: HTTP {status}"))
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::RemoteUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::RemoteUnavailable(format!("malformed response: {err}"))
    }
}
