use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};

use crate::config::Config;
use crate::domain::models::{Credential, MovieId};
use crate::error::SyncError;
use crate::infra::cache::MovieCache;
use crate::infra::credentials::CredentialStore;
use crate::infra::source;
use crate::infra::tmdb::{ExternalSource, TmdbClient};
use crate::workflows::auth::{AuthorizationFlow, TerminalConfirmation};
use crate::workflows::pipeline::ResolutionPipeline;
use crate::workflows::resolver::RemoteResolver;

/// Pulls the feed, resolves every title and pushes the ids to the list.
pub fn sync(config: &Config) -> Result<()> {
    let credential = saved_credential(config)?;
    let list_id = config.list_id()?;
    let source_url = config.source_url()?;

    let client = TmdbClient::new(config.api_key()?.to_string());
    let cache = MovieCache::open(&config.cache_path())
        .with_context(|| format!("Failed to open cache {}", config.cache_path().display()))?;
    let pipeline = ResolutionPipeline::new(cache, RemoteResolver::new(client));

    println!("Getting titles from the source...");
    let titles = source::fetch_titles(source_url).context("Failed to fetch titles")?;
    println!("{} titles found!", titles.len());

    println!("Getting the TMDB id of each title...");
    let ids = pipeline.resolve_many(&titles);
    let missing = titles.len() - ids.len();
    println!(
        "{} ids found! We could not find the id of {} titles.",
        ids.len(),
        missing
    );

    if let Ok(cached) = pipeline.cache().count() {
        tracing::debug!("Cache now holds {cached} titles");
    }

    let client = pipeline.resolver().search();
    add_to_list(client, list_id, &ids, &credential)?;

    println!("Updating list description...");
    let description = build_description(Local::now().date_naive());
    client
        .update_list_description(list_id, &description, &credential.token)
        .map_err(|e| {
            tracing::error!("Updating the description of list {list_id} failed: {e}");
            e
        })?;

    println!("Done!");
    Ok(())
}

/// Adds a single movie, given as a TMDB id or an IMDb/Wikidata id.
pub fn add(config: &Config, id: &str, title: Option<&str>) -> Result<()> {
    let list_id = config.list_id()?;
    let client = TmdbClient::new(config.api_key()?.to_string());
    let resolver = RemoteResolver::new(client);

    let movie_id = match ExternalSource::detect(id) {
        Some(source) => {
            println!("Transforming {} to a TMDB id...", source.as_str());
            match resolver.resolve_by_external_id(id, source) {
                Some(movie_id) => movie_id,
                None => bail!("Unable to find the TMDB id of {id}"),
            }
        }
        None => match id.parse::<u64>() {
            Ok(raw) => MovieId(raw),
            Err(_) => bail!("'{id}' is neither a TMDB id nor an IMDb id"),
        },
    };

    if let Some(title) = title {
        println!("Adding movie to the database...");
        let cache = MovieCache::open(&config.cache_path())?;
        cache.store(movie_id, title)?;
        println!("Movie successfully added to the database!");
    }

    let credential = saved_credential(config)?;
    add_to_list(resolver.search(), list_id, &[movie_id], &credential)?;
    Ok(())
}

/// Runs the interactive authorization flow and saves the access token.
pub fn authorize(config: &Config) -> Result<()> {
    let client = TmdbClient::new(config.api_key()?.to_string())
        .with_read_access_token(config.read_access_token()?.to_string());
    let store = CredentialStore::new(config.credential_path());

    let mut flow = AuthorizationFlow::new(&client, TerminalConfirmation, &store);
    let credential = flow.run();
    tracing::debug!("Authorization finished in state {:?}", flow.state());
    if credential.is_none() {
        bail!("TMDB authorization failed");
    }
    Ok(())
}

fn saved_credential(config: &Config) -> Result<Credential> {
    match CredentialStore::new(config.credential_path()).load() {
        Some(credential) => Ok(credential),
        None => Err(SyncError::Unauthorized.into()),
    }
}

fn add_to_list(
    client: &TmdbClient,
    list_id: &str,
    ids: &[MovieId],
    credential: &Credential,
) -> Result<()> {
    if ids.is_empty() {
        println!("No movies to add to the TMDB list, skipping.");
        return Ok(());
    }

    println!("Adding {} movies to the TMDB list...", ids.len());
    let report = client
        .add_movies_to_list(list_id, ids, &credential.token)
        .map_err(|e| {
            tracing::error!("Adding movies to list {list_id} failed: {e}");
            e
        })?;

    println!(
        "Added {} movies; {} were already on the list or unknown to TMDB",
        report.added,
        report.not_added.len()
    );
    if !report.not_added.is_empty() {
        tracing::debug!("Not added: {:?}", report.not_added);
    }
    Ok(())
}

pub fn build_description(today: NaiveDate) -> String {
    format!(
        "**Automated** list of movies that have been on Netflix.\n\
         Last update: {}",
        today.format("%-d %B %Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let file: ConfigFile = toml::from_str(&format!(
            "tmdb_api_key = \"key\"\ntmdb_list_id = \"8100\"\ndata_dir = {:?}\n",
            dir.path().to_string_lossy()
        ))
        .unwrap();
        Config::from_sources(file, |_| None)
    }

    #[test]
    fn test_build_description() {
        let description = build_description(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(description.starts_with("**Automated**"));
        assert!(description.ends_with("Last update: 19 October 2026"));

        let description = build_description(NaiveDate::from_ymd_opt(2020, 8, 3).unwrap());
        assert!(description.ends_with("Last update: 3 August 2020"));
    }

    #[test]
    fn test_empty_batch_skips_list_request() {
        // Unroutable list id: any request would fail.
        let client = TmdbClient::new("key".to_string());
        let credential = Credential {
            token: "token".to_string(),
        };

        assert!(add_to_list(&client, "does-not-exist", &[], &credential).is_ok());
    }

    #[test]
    fn test_sync_without_credential_is_unauthorized() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let err = sync(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::Unauthorized)
        ));
        assert!(!config.cache_path().exists());
    }

    #[test]
    fn test_add_rejects_garbage_id() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let err = add(&config, "not-an-id", None).unwrap_err();
        assert!(err.to_string().contains("neither a TMDB id nor an IMDb id"));
    }

    #[test]
    fn test_add_caches_title_before_requiring_credential() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let err = add(&config, "680", Some("Pulp Fiction")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::Unauthorized)
        ));

        let cache = MovieCache::open(&config.cache_path()).unwrap();
        assert_eq!(cache.lookup("Pulp Fiction").unwrap(), Some(MovieId(680)));
    }
}
