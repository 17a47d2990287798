//! Content-addressed blob storage.

use crate::error::{Error, Result};
use crate::hash::Hash;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write-once store of raw file content under `objects/<hex>`.
///
/// Objects are never rewritten or removed once present. Two files with the
/// same content share a single object.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    dir: PathBuf,
}

impl ObjectStore {
    /// Create a store rooted at the given `objects` directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the directory holding the objects.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path to an object file given its hash.
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        self.dir.join(hash.to_hex())
    }

    /// Whether an object with this hash is stored.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.object_path(hash).exists()
    }

    /// Store content and return its hash.
    ///
    /// Writing content that is already stored is a no-op. There is no
    /// collision check: an existing object with the same name is assumed to
    /// hold the same content.
    pub fn write(&self, content: &[u8]) -> Result<Hash> {
        let hash = Hash::hash_bytes(content);

        if self.contains(&hash) {
            debug!(hash = %hash.short(), "object already stored");
            return Ok(hash);
        }

        write_atomic(&self.dir, &self.object_path(&hash), content)?;
        debug!(hash = %hash.short(), size = content.len(), "stored object");

        Ok(hash)
    }

    /// Retrieve content by hash.
    ///
    /// The content is re-hashed on read so on-disk corruption is reported
    /// instead of silently materialized.
    pub fn read(&self, hash: &Hash) -> Result<Vec<u8>> {
        let obj_path = self.object_path(hash);

        if !obj_path.exists() {
            return Err(Error::object_not_found(hash.to_hex()));
        }

        let content = fs::read(&obj_path)?;

        let computed_hash = Hash::hash_bytes(&content);
        if computed_hash != *hash {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Hash mismatch: expected {}, got {}",
                    hash.to_hex(),
                    computed_hash.to_hex()
                ),
            ));
        }

        Ok(content)
    }
}

/// Write a file atomically: temp file in `dir`, then rename over `dest`.
pub(crate) fn write_atomic(dir: &Path, dest: &Path, content: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
    temp_file.write_all(content)?;
    temp_file.flush()?;

    // Persist atomically
    temp_file.persist(dest)?;

    Ok(())
}
