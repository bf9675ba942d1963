//! Object storage for uploaded book files.

use crate::error::{Result, RoteiroError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// A bucket of opaque objects addressed by relative path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a new object. Fails with `Storage` if `path` is already taken.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()>;

    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    async fn remove(&self, path: &str) -> Result<()>;
}

/// Bucket stored as files under a root directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(RoteiroError::Storage(format!("Invalid object path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    RoteiroError::Storage(format!("Object already exists: {}", path))
                }
                _ => RoteiroError::Storage(format!("Failed to create {}: {}", path, e)),
            })?;
        file.write_all(bytes).await?;
        file.flush().await?;
        debug!("Stored object at {:?}", target);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        tokio::fs::read(&target).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RoteiroError::NotFound(format!("Object {}", path)),
            _ => RoteiroError::Storage(format!("Failed to read {}: {}", path, e)),
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| RoteiroError::Storage(format!("Failed to remove {}: {}", path, e)))
    }
}

/// In-memory bucket for tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    fail_removals: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `remove` fail.
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects
            .read()
            .map(|objects| objects.contains_key(path))
            .unwrap_or(false)
    }
}

fn poisoned(e: impl std::fmt::Display) -> RoteiroError {
    RoteiroError::Storage(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let mut objects = self.objects.write().map_err(poisoned)?;
        if objects.contains_key(path) {
            return Err(RoteiroError::Storage(format!("Object already exists: {}", path)));
        }
        objects.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .map_err(poisoned)?
            .get(path)
            .cloned()
            .ok_or_else(|| RoteiroError::NotFound(format!("Object {}", path)))
    }

    async fn remove(&self, path: &str) -> Result<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(RoteiroError::Storage(format!("Failed to remove {}", path)));
        }
        self.objects.write().map_err(poisoned)?.remove(path);
        Ok(())
    }
}
