use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Topic marking the one-time introduction post.
pub const INTRODUCTION_TOPIC: &str = "introduction";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub topic: Option<String>,
    pub phase: Option<String>,
}

/// Post history backed by a single JSON document: read fully on load,
/// rewritten fully on every append. Entries are never mutated or
/// deleted. Single writer; concurrent runs are not coordinated.
pub struct PostStore {
    path: PathBuf,
    entries: Vec<PostEntry>,
}

impl PostStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            info!(
                "[STORE] No post history at {}, starting empty",
                path.display()
            );
            return Ok(Self {
                path,
                entries: Vec::new(),
            });
        }

        let contents = fs::read_to_string(&path)?;
        let entries = match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "[STORE] Post history at {} is empty or invalid ({}), starting empty",
                    path.display(),
                    e
                );
                Vec::new()
            }
        };
        Ok(Self { path, entries })
    }

    pub fn append(&mut self, entry: PostEntry) -> Result<()> {
        self.entries.push(entry);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }

    pub fn has_introduction(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.topic.as_deref() == Some(INTRODUCTION_TOPIC))
    }

    pub fn texts(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.text.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, topic: Option<&str>) -> PostEntry {
        PostEntry {
            text: text.to_string(),
            timestamp: Utc::now(),
            topic: topic.map(str::to_string),
            phase: None,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PostStore::load(dir.path().join("posts.json")).unwrap();
        assert!(store.texts().is_empty());
        assert!(!store.has_introduction());
    }

    #[test]
    fn append_persists_and_reload_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");

        let mut store = PostStore::load(&path).unwrap();
        store.append(entry("first", Some(INTRODUCTION_TOPIC))).unwrap();
        store.append(entry("second", Some("indie games"))).unwrap();

        let reloaded = PostStore::load(&path).unwrap();
        assert_eq!(reloaded.texts(), vec!["first", "second"]);
        assert!(reloaded.has_introduction());
    }

    #[test]
    fn malformed_document_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        fs::write(&path, "not json at all").unwrap();

        let store = PostStore::load(&path).unwrap();
        assert!(store.texts().is_empty());
    }

    #[test]
    fn introduction_gate_only_matches_the_introduction_topic() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PostStore::load(dir.path().join("posts.json")).unwrap();
        store.append(entry("a post", Some("roguelike"))).unwrap();
        store.append(entry("another", None)).unwrap();
        assert!(!store.has_introduction());

        store.append(entry("hi", Some(INTRODUCTION_TOPIC))).unwrap();
        assert!(store.has_introduction());
    }
}
