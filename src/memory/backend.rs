//! Memory store backends.

use crate::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Key-value persistence of one memory string per user identity.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get(&self, identity: &str) -> Result<Option<String>>;
    async fn put(&self, identity: &str, memory: &str) -> Result<()>;
    async fn delete(&self, identity: &str) -> Result<bool>;
    fn name(&self) -> &'static str;
}

/// Process-local store; contents are lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn get(&self, identity: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(identity).cloned())
    }
    async fn put(&self, identity: &str, memory: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(identity.to_string(), memory.to_string());
        Ok(())
    }
    async fn delete(&self, identity: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(identity).is_some())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

/// One file per user under a directory.
///
/// File names are the SHA-256 of the identity so that e-mail addresses never
/// show up on disk.
#[derive(Debug, Clone)]
pub struct FileMemoryStore {
    dir: PathBuf,
}

impl FileMemoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, identity: &str) -> PathBuf {
        let digest = Sha256::digest(identity.as_bytes());
        self.dir.join(format!("{:x}.memory", digest))
    }
}

#[async_trait]
impl MemoryStore for FileMemoryStore {
    async fn get(&self, identity: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(identity)).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
    async fn put(&self, identity: &str, memory: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(identity), memory).await?;
        Ok(())
    }
    async fn delete(&self, identity: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(identity)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("a@b").await.unwrap(), None);
        store.put("a@b", "Cell 1").await.unwrap();
        assert_eq!(store.get("a@b").await.unwrap().as_deref(), Some("Cell 1"));
        assert!(store.delete("a@b").await.unwrap());
        assert!(!store.delete("a@b").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_hashes_identity() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileMemoryStore::new(tmp.path().join("memory"));
        assert_eq!(store.get("dana@plant.example").await.unwrap(), None);

        store.put("dana@plant.example", "Uses KUKA").await.unwrap();
        assert_eq!(
            store.get("dana@plant.example").await.unwrap().as_deref(),
            Some("Uses KUKA")
        );

        let names: Vec<String> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].contains("dana"));
        assert!(names[0].ends_with(".memory"));

        assert!(store.delete("dana@plant.example").await.unwrap());
        assert!(!store.delete("dana@plant.example").await.unwrap());
    }
}
