use regex::Regex;
use std::sync::LazyLock;

use crate::domain::models::MovieId;
use crate::infra::tmdb::{ExternalSource, MovieSearch};

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *\([^)]*\) *").expect("parenthetical pattern is valid"));

/// Best-effort title -> id lookup against the metadata service.
///
/// Request failures are logged and reported as "not found"; nothing here
/// returns an error.
pub struct RemoteResolver<S> {
    search: S,
}

impl<S: MovieSearch> RemoteResolver<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    pub fn search_by_title(&self, query: &str) -> Option<MovieId> {
        match self.search.search_movie_id(query) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                tracing::debug!("No search results for {query:?}");
                None
            }
            Err(e) => {
                tracing::warn!("Search for {query:?} failed: {e}");
                None
            }
        }
    }

    /// Tries the raw title, then progressively less specific forms of it,
    /// stopping at the first hit.
    pub fn resolve_by_title(&self, title: &str) -> Option<MovieId> {
        candidate_queries(title)
            .into_iter()
            .find_map(|query| self.search_by_title(&query))
    }

    pub fn resolve_by_external_id(
        &self,
        external_id: &str,
        source: ExternalSource,
    ) -> Option<MovieId> {
        match self.search.find_by_external_id(external_id, source) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                tracing::debug!("No movie found for {} {external_id}", source.as_str());
                None
            }
            Err(e) => {
                tracing::warn!("Lookup of {} {external_id} failed: {e}", source.as_str());
                None
            }
        }
    }
}

/// Queries to try for `title`, most specific first.
///
/// 1. the title as given
/// 2. without any `(...)` groups, if it has one
/// 3. the part before the first colon, if it has one
///
/// Empty and repeated queries are skipped.
pub fn candidate_queries(title: &str) -> Vec<String> {
    let raw = title.trim();
    let mut queries: Vec<String> = Vec::new();
    let mut push = |query: &str| {
        let query = query.trim();
        if !query.is_empty() && !queries.iter().any(|q| q == query) {
            queries.push(query.to_string());
        }
    };

    push(raw);

    if raw.contains('(') && raw.contains(')') {
        push(&strip_parentheticals(raw));
    }

    if let Some((before_colon, _)) = raw.split_once(':') {
        push(before_colon);
    }

    queries
}

/// Removes every `(...)` group together with the spaces around it.
fn strip_parentheticals(title: &str) -> String {
    PARENTHETICAL.replace_all(title, "").into_owned()
}
