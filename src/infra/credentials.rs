use crate::domain::models::Credential;
use crate::error::SyncResult;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// JSON file holding the TMDB user access token.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Missing and malformed files both read as "no credential".
    pub fn load(&self) -> Option<Credential> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("No saved credential at {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<Credential>(&content) {
            Ok(credential) if !credential.token.trim().is_empty() => Some(credential),
            Ok(_) => {
                tracing::warn!("Saved credential at {} is empty", self.path.display());
                None
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed credential file {}: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    /// Writes to a temp file in the same directory and renames it into place.
    pub fn save(&self, credential: &Credential) -> SyncResult<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut file = tempfile::NamedTempFile::new_in(&parent)?;
        let content = serde_json::to_string(credential)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        file.write_all(content.as_bytes())?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("tmdb.json"));

        store
            .save(&Credential {
                token: "eyJhbGciOi".to_string(),
            })
            .unwrap();

        assert_eq!(
            store.load(),
            Some(Credential {
                token: "eyJhbGciOi".to_string()
            })
        );
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"token":"eyJhbGciOi"}"#);
    }

    #[test]
    fn test_missing_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("tmdb.json"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_malformed_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tmdb.json");
        let store = CredentialStore::new(path.clone());

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(store.load(), None);

        std::fs::write(&path, r#"{"token":"   "}"#).unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_reads_legacy_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tmdb.json");
        std::fs::write(&path, r#"{"accessToken":"legacy"}"#).unwrap();

        let store = CredentialStore::new(path);
        assert_eq!(store.load().map(|c| c.token), Some("legacy".to_string()));
    }
}
