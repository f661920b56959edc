//! # Response Cache
//!
//! Maps an exact prompt string to the response text it produced, persisted as a
//! single JSON object. Every lookup reloads the whole file and every store
//! rewrites it. Failures are logged and swallowed: a broken cache only ever
//! degrades to a miss.
//!
//! There is no locking. Two processes sharing a file race, and the last writer wins.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

pub type CacheMap = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct ResponseCache {
    path: PathBuf,
}

impl ResponseCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached response for `prompt`, if any.
    pub fn get(&self, prompt: &str) -> Option<String> {
        self.load().remove(prompt)
    }

    /// Store `response` under `prompt`.
    ///
    /// The file is reloaded first so entries written since the last lookup survive.
    pub fn put(&self, prompt: &str, response: &str) {
        let mut entries = self.load();
        entries.insert(prompt.to_string(), response.to_string());

        let json = match serde_json::to_string(&entries) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to save cache: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to save cache: {}", e);
                return;
            }
        }

        match fs::write(&self.path, json) {
            Ok(()) => debug!("Cached response ({} entries in {})", entries.len(), self.path.display()),
            Err(e) => error!("Failed to save cache: {}", e),
        }
    }

    /// Whole mapping; empty when the file is missing or unreadable.
    pub fn load(&self) -> CacheMap {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return CacheMap::new(),
            Err(e) => {
                warn!("Failed to load cache, starting with empty cache: {}", e);
                return CacheMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Failed to load cache, starting with empty cache: {}", e);
            CacheMap::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_in(dir: &tempfile::TempDir) -> ResponseCache {
        ResponseCache::new(dir.path().join("llm_cache.json"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        assert!(cache.load().is_empty());
        assert_eq!(cache.get("anything"), None);
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.put("Hello, how are you?", "Fine, thanks.");
        assert_eq!(cache.get("Hello, how are you?").as_deref(), Some("Fine, thanks."));

        let raw = fs::read_to_string(cache.path()).unwrap();
        let on_disk: CacheMap = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn test_keys_are_not_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.put("hello", "a");
        assert_eq!(cache.get("Hello"), None);
        assert_eq!(cache.get("hello "), None);
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.put("p", "old");
        cache.put("p", "new");
        assert_eq!(cache.get("p").as_deref(), Some("new"));
        assert_eq!(cache.load().len(), 1);
    }

    #[test]
    fn test_put_keeps_entries_written_by_others() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.put("first", "1");

        // Another writer adds an entry behind our back
        let other = ResponseCache::new(cache.path());
        other.put("second", "2");

        cache.put("third", "3");
        let entries = cache.load();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["second"], "2");
    }

    #[test]
    fn test_malformed_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        fs::write(cache.path(), "{not json").unwrap();

        assert_eq!(cache.get("p"), None);
        cache.put("p", "r");
        assert_eq!(cache.get("p").as_deref(), Some("r"));
    }

    #[test]
    fn test_non_string_values_are_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        fs::write(cache.path(), r#"{"p": 42}"#).unwrap();
        assert_eq!(cache.get("p"), None);
    }

    #[test]
    fn test_unwritable_path_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        let cache = ResponseCache::new(&blocked);

        cache.put("p", "r");
        assert_eq!(cache.get("p"), None);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("nested/deeper/cache.json"));
        cache.put("p", "r");
        assert_eq!(cache.get("p").as_deref(), Some("r"));
    }
}
