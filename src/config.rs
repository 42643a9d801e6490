use anyhow::bail;
use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "movie-list-sync";

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    tmdb_api_key: Option<String>,
    tmdb_read_access_token: Option<String>,
    tmdb_list_id: Option<String>,
    movies_source_url: Option<String>,
    data_dir: Option<PathBuf>,
}

/// Settings resolved once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: Option<String>,
    pub tmdb_read_access_token: Option<String>,
    pub tmdb_list_id: Option<String>,
    pub movies_source_url: Option<String>,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_dir_path().join("config.toml");
        let file = if config_path.exists() {
            let config_content = fs::read_to_string(&config_path)?;
            toml::from_str(&config_content)?
        } else {
            ConfigFile::default()
        };

        Ok(Self::from_sources(file, |key| env::var(key).ok()))
    }

    /// Environment variables take precedence over the config file.
    pub fn from_sources(file: ConfigFile, env_var: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, fallback: Option<String>| {
            env_var(key).filter(|v| !v.is_empty()).or(fallback)
        };

        Self {
            tmdb_api_key: pick("TMDB_API_KEY", file.tmdb_api_key),
            tmdb_read_access_token: pick("TMDB_READ_ACCESS_TOKEN", file.tmdb_read_access_token),
            tmdb_list_id: pick("TMDB_LIST_ID", file.tmdb_list_id),
            movies_source_url: pick("MOVIES_SOURCE_URL", file.movies_source_url),
            data_dir: pick(
                "MOVIE_LIST_SYNC_DATA_DIR",
                file.data_dir.map(|p| p.to_string_lossy().into_owned()),
            )
            .map(PathBuf::from)
            .unwrap_or_else(get_config_dir_path),
        }
    }

    pub fn api_key(&self) -> Result<&str> {
        require(&self.tmdb_api_key, "TMDB_API_KEY", "tmdb_api_key")
    }

    pub fn read_access_token(&self) -> Result<&str> {
        require(
            &self.tmdb_read_access_token,
            "TMDB_READ_ACCESS_TOKEN",
            "tmdb_read_access_token",
        )
    }

    pub fn list_id(&self) -> Result<&str> {
        require(&self.tmdb_list_id, "TMDB_LIST_ID", "tmdb_list_id")
    }

    pub fn source_url(&self) -> Result<&str> {
        require(&self.movies_source_url, "MOVIES_SOURCE_URL", "movies_source_url")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("movies.db")
    }

    pub fn credential_path(&self) -> PathBuf {
        self.data_dir.join("tmdb.json")
    }
}

fn require<'a>(value: &'a Option<String>, env_key: &str, file_key: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) => Ok(v),
        None => bail!(
            "{env_key} not found. Set the {env_key} environment variable or add {file_key} = \"...\" to {}",
            get_config_dir_path().join("config.toml").display()
        ),
    }
}

fn get_config_dir_path() -> PathBuf {
    xdir::config()
        .map(|path| path.join(APP_DIR))
        // If the standard path could not be found (e.g.`$HOME` is not set),
        // default to the current directory.
        .unwrap_or_default()
}
