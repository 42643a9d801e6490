use crate::domain::models::{normalize_title, MovieId};
use crate::infra::cache::MovieCache;
use crate::infra::tmdb::MovieSearch;
use crate::workflows::resolver::RemoteResolver;

/// Cache-first title resolution.
///
/// Storage and remote failures never escape: they are logged and the title
/// is treated as unresolved.
pub struct ResolutionPipeline<S> {
    cache: MovieCache,
    resolver: RemoteResolver<S>,
}

impl<S: MovieSearch> ResolutionPipeline<S> {
    pub fn new(cache: MovieCache, resolver: RemoteResolver<S>) -> Self {
        Self { cache, resolver }
    }

    pub fn cache(&self) -> &MovieCache {
        &self.cache
    }

    pub fn resolver(&self) -> &RemoteResolver<S> {
        &self.resolver
    }

    pub fn resolve_one(&self, title: &str) -> Option<MovieId> {
        let title = normalize_title(title);
        if title.is_empty() {
            return None;
        }

        match self.cache.lookup(&title) {
            Ok(Some(id)) => {
                tracing::debug!("Cache hit for {title:?}: {id}");
                return Some(id);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache lookup for {title:?} failed: {e}"),
        }

        let id = self.resolver.resolve_by_title(&title)?;
        if let Err(e) = self.cache.store(id, &title) {
            tracing::warn!("Failed to cache {title:?} -> {id}: {e}");
        }
        Some(id)
    }

    /// Resolves titles one at a time, keeping input order and dropping the
    /// ones that could not be resolved.
    pub fn resolve_many<T: AsRef<str>>(&self, titles: &[T]) -> Vec<MovieId> {
        let mut ids = Vec::with_capacity(titles.len());
        for (idx, title) in titles.iter().enumerate() {
            if (idx + 1) % 50 == 0 {
                tracing::info!("  Resolved {}/{} titles...", idx + 1, titles.len());
            }

            match self.resolve_one(title.as_ref()) {
                Some(id) => ids.push(id),
                None => tracing::debug!("Could not find an id for {:?}", title.as_ref()),
            }
        }
        ids
    }
}
