//! The external artifact index contract (`index.from_data(filename, bytes)
//! -> stored_name`), plus an in-process reference implementation used by
//! the downloader's integration tests. The real on-disk index (the thing
//! that later feeds the build/install steps) is an external collaborator;
//! this crate only owns the narrow boundary the downloader calls through.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to write artifact `{0}` to the index")]
    Io(String, #[source] std::io::Error),
}

/// Store downloaded bytes under a content-addressed name and return that
/// name. This is the only thing the downloader needs from the index; how
/// (or where) the bytes are actually persisted is entirely up to the
/// implementation.
#[async_trait]
pub trait ArtifactIndex: Send + Sync {
    async fn from_data(&self, filename: &str, bytes: &[u8]) -> Result<String, IndexError>;
}

/// Content-address `bytes` as `<sha256-hex>/<filename>`: a shard-style path
/// with the hash as a leading directory component, rather than spliced into
/// the filename with a `-`. The `wheel`/`tarball` data slots this name is
/// stored into are later read back through `WheelFilename::version_field`,
/// which expects the filename's own `name-version-...` grammar to start at
/// field zero — a `<hash>-<filename>` join would shift that grammar by one
/// field and make every recovered version unparsable.
fn stored_name(filename: &str, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    format!("{:x}/{filename}", digest)
}

/// An in-memory index: keeps every stored artifact's bytes in a map, keyed
/// by the same content-addressed name it hands back. Used by unit tests
/// that don't want to touch the filesystem.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stored_name: &str) -> Option<Vec<u8>> {
        self.artifacts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(stored_name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactIndex for InMemoryIndex {
    async fn from_data(&self, filename: &str, bytes: &[u8]) -> Result<String, IndexError> {
        let name = stored_name(filename, bytes);
        self.artifacts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(name.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(name)
    }
}

/// An index backed by a directory on disk: each artifact is written once
/// under its content-addressed name, so repeated downloads of identical
/// bytes are a no-op past the first write. Used by integration tests that
/// want to exercise the downloader end to end without a real build step.
#[derive(Debug, Clone)]
pub struct TempDirIndex {
    root: PathBuf,
}

impl TempDirIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }
}

#[async_trait]
impl ArtifactIndex for TempDirIndex {
    async fn from_data(&self, filename: &str, bytes: &[u8]) -> Result<String, IndexError> {
        let name = stored_name(filename, bytes);
        let path = self.path_of(&name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(?path, "artifact already present in index");
            return Ok(name);
        }
        write_new(&path, bytes)
            .await
            .map_err(|err| IndexError::Io(name.clone(), err))?;
        Ok(name)
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_index_round_trips_bytes() {
        let index = InMemoryIndex::new();
        let name = index.from_data("foo-1.0.tar.gz", b"hello").await.unwrap();
        assert!(name.ends_with("/foo-1.0.tar.gz"));
        assert_eq!(index.get(&name).as_deref(), Some(b"hello".as_slice()));
    }

    #[tokio::test]
    async fn identical_bytes_produce_the_same_stored_name() {
        let index = InMemoryIndex::new();
        let a = index.from_data("foo-1.0.tar.gz", b"hello").await.unwrap();
        let b = index.from_data("foo-1.0.tar.gz", b"hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn different_bytes_produce_different_stored_names() {
        let index = InMemoryIndex::new();
        let a = index.from_data("foo-1.0.tar.gz", b"hello").await.unwrap();
        let b = index.from_data("foo-1.0.tar.gz", b"goodbye").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn temp_dir_index_writes_bytes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let index = TempDirIndex::new(dir.path());
        let name = index.from_data("foo-1.0.tar.gz", b"hello").await.unwrap();
        let bytes = tokio::fs::read(index.path_of(&name)).await.unwrap();
        assert_eq!(bytes, b"hello");
    }
}
