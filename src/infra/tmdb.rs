use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::domain::models::MovieId;
use crate::error::{SyncError, SyncResult};

const TMDB_API_BASE: &str = "https://api.themoviedb.org";
const TMDB_AUTH_URL: &str = "https://www.themoviedb.org/auth/access";

/// Namespaces accepted by the TMDB `/find` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalSource {
    Imdb,
    Wikidata,
}

impl ExternalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalSource::Imdb => "imdb_id",
            ExternalSource::Wikidata => "wikidata_id",
        }
    }

    /// Recognizes `tt0110912` (IMDb) and `Q104123` (Wikidata) style ids.
    pub fn detect(id: &str) -> Option<Self> {
        let digits_after = |prefix: &str| {
            id.strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        };
        if digits_after("tt") {
            Some(ExternalSource::Imdb)
        } else if digits_after("Q") {
            Some(ExternalSource::Wikidata)
        } else {
            None
        }
    }
}

/// Movie lookups the resolver needs from the metadata service.
pub trait MovieSearch {
    /// Top-ranked match for `query`, `Ok(None)` when the result set is empty.
    fn search_movie_id(&self, query: &str) -> SyncResult<Option<MovieId>>;

    fn find_by_external_id(
        &self,
        external_id: &str,
        source: ExternalSource,
    ) -> SyncResult<Option<MovieId>>;
}

/// The request-token handshake used by the authorization flow.
pub trait AuthApi {
    fn request_token(&self) -> SyncResult<String>;

    /// Page where the user approves `request_token`.
    fn authorization_url(&self, request_token: &str) -> String {
        format!("{TMDB_AUTH_URL}?request_token={request_token}")
    }

    fn access_token(&self, request_token: &str) -> SyncResult<String>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct RequestTokenResponse {
    success: bool,
    request_token: Option<String>,
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    success: bool,
    access_token: Option<String>,
    status_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListItem {
    media_type: &'static str,
    media_id: u64,
}

#[derive(Debug, Deserialize)]
struct ListItemsResponse {
    success: bool,
    #[serde(default)]
    results: Vec<ListItemResult>,
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItemResult {
    media_id: u64,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    success: bool,
    status_message: Option<String>,
}

/// Outcome of adding a batch of movies to a list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddItemsReport {
    pub added: usize,
    /// Already on the list or unknown to TMDB.
    pub not_added: Vec<MovieId>,
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: Client,
    api_key: String,
    read_access_token: Option<String>,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            read_access_token: None,
        }
    }

    pub fn with_read_access_token(mut self, token: String) -> Self {
        self.read_access_token = Some(token);
        self
    }

    fn v3(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{TMDB_API_BASE}/3{path}"))
            .query(&[("api_key", self.api_key.as_str())])
    }

    fn v4_post(&self, path: &str, bearer: &str, body: serde_json::Value) -> RequestBuilder {
        self.http
            .post(format!("{TMDB_API_BASE}/4{path}"))
            .header("Authorization", format!("Bearer {bearer}"))
            .header("Content-Type", "application/json;charset=utf-8")
            .body(body.to_string())
    }

    fn read_token(&self) -> SyncResult<&str> {
        self.read_access_token.as_deref().ok_or(SyncError::Unauthorized)
    }

    /// Adds every id to the list in a single request.
    pub fn add_movies_to_list(
        &self,
        list_id: &str,
        ids: &[MovieId],
        access_token: &str,
    ) -> SyncResult<AddItemsReport> {
        let items: Vec<ListItem> = ids
            .iter()
            .map(|id| ListItem {
                media_type: "movie",
                media_id: id.0,
            })
            .collect();
        let body = serde_json::json!({ "items": items });

        let response = self
            .v4_post(&format!("/list/{list_id}/items"), access_token, body)
            .send()?;
        let parsed: ListItemsResponse = parse("TMDB list update", response)?;

        if !parsed.success && parsed.results.is_empty() {
            return Err(SyncError::Rejected(
                parsed
                    .status_message
                    .unwrap_or_else(|| "list update failed".to_string()),
            ));
        }

        let mut report = AddItemsReport::default();
        for result in parsed.results {
            if result.success {
                report.added += 1;
            } else {
                report.not_added.push(MovieId(result.media_id));
            }
        }
        Ok(report)
    }

    pub fn update_list_description(
        &self,
        list_id: &str,
        description: &str,
        access_token: &str,
    ) -> SyncResult<()> {
        let body = serde_json::json!({ "description": description });
        let response = self
            .http
            .put(format!("{TMDB_API_BASE}/4/list/{list_id}"))
            .header("Authorization", format!("Bearer {access_token}"))
            .header("Content-Type", "application/json;charset=utf-8")
            .body(body.to_string())
            .send()?;

        let parsed: StatusResponse = parse("TMDB list description update", response)?;
        if !parsed.success {
            return Err(SyncError::Rejected(
                parsed
                    .status_message
                    .unwrap_or_else(|| "description update failed".to_string()),
            ));
        }
        Ok(())
    }
}

impl MovieSearch for TmdbClient {
    fn search_movie_id(&self, query: &str) -> SyncResult<Option<MovieId>> {
        let response = self
            .v3("/search/movie")
            .query(&[("query", query), ("include_adult", "true")])
            .send()?;

        let parsed: SearchResponse = parse("TMDB search", response)?;
        Ok(top_result(&parsed.results))
    }

    fn find_by_external_id(
        &self,
        external_id: &str,
        source: ExternalSource,
    ) -> SyncResult<Option<MovieId>> {
        let response = self
            .v3(&format!("/find/{external_id}"))
            .query(&[("external_source", source.as_str())])
            .send()?;

        let parsed: FindResponse = parse("TMDB find", response)?;
        Ok(top_result(&parsed.movie_results))
    }
}

impl AuthApi for TmdbClient {
    fn request_token(&self) -> SyncResult<String> {
        let response = self
            .v4_post("/auth/request_token", self.read_token()?, serde_json::json!({}))
            .send()?;

        let parsed: RequestTokenResponse = parse("TMDB request token", response)?;
        match parsed.request_token {
            Some(token) if parsed.success => Ok(token),
            _ => Err(SyncError::Rejected(
                parsed
                    .status_message
                    .unwrap_or_else(|| "no request token issued".to_string()),
            )),
        }
    }

    fn access_token(&self, request_token: &str) -> SyncResult<String> {
        let body = serde_json::json!({ "request_token": request_token });
        let response = self
            .v4_post("/auth/access_token", self.read_token()?, body)
            .send()?;

        let parsed: AccessTokenResponse = parse("TMDB access token", response)?;
        match parsed.access_token {
            Some(token) if parsed.success => Ok(token),
            _ => Err(SyncError::Rejected(
                parsed
                    .status_message
                    .unwrap_or_else(|| "request token was not approved".to_string()),
            )),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(context: &str, response: Response) -> SyncResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::from_status(context, status));
    }
    Ok(serde_json::from_str(&response.text()?)?)
}

fn top_result(results: &[SearchResult]) -> Option<MovieId> {
    results.first().map(|r| MovieId(r.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_external_source() {
        assert_eq!(ExternalSource::detect("tt0110912"), Some(ExternalSource::Imdb));
        assert_eq!(ExternalSource::detect("Q104123"), Some(ExternalSource::Wikidata));
        assert_eq!(ExternalSource::detect("680"), None);
        assert_eq!(ExternalSource::detect("tt"), None);
        assert_eq!(ExternalSource::detect("ttabc"), None);
    }

    #[test]
    fn test_authorization_url() {
        let client = TmdbClient::new("key".to_string());
        assert_eq!(
            client.authorization_url("abc123"),
            "https://www.themoviedb.org/auth/access?request_token=abc123"
        );
    }

    #[test]
    fn test_search_response_takes_first_result() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"page":1,"results":[{"id":273248,"title":"The Hateful Eight"},{"id":1,"title":"Other"}],"total_results":2}"#,
        )
        .unwrap();
        assert_eq!(top_result(&parsed.results), Some(MovieId(273248)));

        let empty: SearchResponse = serde_json::from_str(r#"{"page":1,"results":[]}"#).unwrap();
        assert_eq!(top_result(&empty.results), None);
    }

    #[test]
    fn test_find_response_without_movies() {
        let parsed: FindResponse =
            serde_json::from_str(r#"{"tv_results":[{"id":1399}],"person_results":[]}"#).unwrap();
        assert_eq!(top_result(&parsed.movie_results), None);
    }

    #[test]
    fn test_list_items_serialization() {
        let body = serde_json::json!({
            "items": [ListItem { media_type: "movie", media_id: 680 }]
        });
        assert_eq!(
            body.to_string(),
            r#"{"items":[{"media_id":680,"media_type":"movie"}]}"#
        );
    }

    #[test]
    fn test_missing_read_token_is_unauthorized() {
        let client = TmdbClient::new("key".to_string());
        assert!(matches!(client.request_token(), Err(SyncError::Unauthorized)));
    }
}
