use crate::domain::models::{normalize_title, MovieId};
use crate::error::SyncResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;

const CREATE_MOVIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    tmdb_id INTEGER UNIQUE,
    title TEXT
)
"#;

/// Permanent title -> TMDB id cache backed by SQLite.
///
/// Rows are only ever inserted. A second insert for an id that is already
/// present is ignored, so the first title seen for a movie wins.
pub struct MovieCache {
    conn: Connection,
}

impl MovieCache {
    pub fn open(path: &Path) -> SyncResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let cache = Self {
            conn: Connection::open(path)?,
        };
        cache.ensure_schema()?;
        Ok(cache)
    }

    pub fn open_in_memory() -> SyncResult<Self> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.ensure_schema()?;
        Ok(cache)
    }

    /// Safe to call on every startup.
    pub fn ensure_schema(&self) -> SyncResult<()> {
        self.conn.execute(CREATE_MOVIES_TABLE, [])?;
        Ok(())
    }

    pub fn lookup(&self, title: &str) -> SyncResult<Option<MovieId>> {
        let id = self
            .conn
            .query_row(
                "SELECT DISTINCT tmdb_id FROM movies WHERE title = ?1",
                [normalize_title(title)],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(|id| MovieId(id as u64)))
    }

    pub fn store(&self, id: MovieId, title: &str) -> SyncResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO movies (tmdb_id, title) VALUES (?1, ?2)",
            params![id.0 as i64, normalize_title(title)],
        )?;
        Ok(())
    }

    pub fn count(&self) -> SyncResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Drops the backing table so every later query fails.
    #[cfg(test)]
    pub(crate) fn break_storage(&self) {
        self.conn.execute("DROP TABLE movies", []).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_then_lookup() {
        let cache = MovieCache::open_in_memory().unwrap();
        cache.store(MovieId(273248), "The Hateful Eight").unwrap();

        assert_eq!(
            cache.lookup("The Hateful Eight").unwrap(),
            Some(MovieId(273248))
        );
        assert_eq!(cache.lookup("Pulp Fiction").unwrap(), None);
    }

    #[test]
    fn test_lookup_normalizes_input() {
        let cache = MovieCache::open_in_memory().unwrap();
        cache.store(MovieId(424), "  Schindler\\'s List ").unwrap();

        assert_eq!(cache.lookup("Schindler's List").unwrap(), Some(MovieId(424)));
        assert_eq!(
            cache.lookup("Schindler\\'s List  ").unwrap(),
            Some(MovieId(424))
        );
    }

    #[test]
    fn test_duplicate_id_is_ignored() {
        let cache = MovieCache::open_in_memory().unwrap();
        cache.store(MovieId(680), "Pulp Fiction").unwrap();
        cache.store(MovieId(680), "Pulp Fiction (1994)").unwrap();

        assert_eq!(cache.count().unwrap(), 1);
        assert_eq!(cache.lookup("Pulp Fiction").unwrap(), Some(MovieId(680)));
        assert_eq!(cache.lookup("Pulp Fiction (1994)").unwrap(), None);
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let cache = MovieCache::open_in_memory().unwrap();
        cache.store(MovieId(1), "One").unwrap();
        cache.ensure_schema().unwrap();
        cache.ensure_schema().unwrap();
        assert_eq!(cache.count().unwrap(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("movies.db");

        {
            let cache = MovieCache::open(&db_path).unwrap();
            cache.store(MovieId(273248), "The Hateful Eight").unwrap();
        }

        let cache = MovieCache::open(&db_path).unwrap();
        assert_eq!(
            cache.lookup("The Hateful Eight").unwrap(),
            Some(MovieId(273248))
        );
    }

    #[test]
    fn test_broken_storage_reports_errors() {
        let cache = MovieCache::open_in_memory().unwrap();
        cache.break_storage();

        assert!(cache.lookup("Pulp Fiction").is_err());
        assert!(cache.store(MovieId(680), "Pulp Fiction").is_err());
    }

    #[test]
    fn test_open_unwritable_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        assert!(MovieCache::open(&blocker.join("movies.db")).is_err());
    }
}
