//! Encrypted blob storage
//!
//! One file per storage name under `objects/`. Writes are atomic (write to a
//! temporary file, fsync, rename) so a crash never leaves a partially written
//! blob visible. Content is optionally LZ4-compressed, then sealed with
//! AES-256-GCM under the session key.
//!
//! On-disk layout: `magic || sealed(flags || payload)`. The flags byte
//! travels inside the authenticated envelope; every bit after the magic is
//! covered by the AEAD tag.

use crate::config::CompressionConfig;
use crate::crypto::{self, StoreKey};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Magic bytes identifying a furtivefs blob
const BLOB_MAGIC: &[u8; 4] = b"FFS1";

/// Sealed flag: payload was LZ4-compressed before encryption
const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Write `contents` to `path` atomically (tmp file + fsync + rename)
pub(crate) async fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Config(format!("invalid target path: {}", path.display())))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(contents).await?;
    // fsync before rename so the rename never exposes a torn file
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// Content store addressed by opaque storage names
#[derive(Debug)]
pub struct BlobStore {
    root: PathBuf,
    compression: CompressionConfig,
}

impl BlobStore {
    /// Open (and create if needed) the object directory
    pub async fn open(root: PathBuf, compression: CompressionConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(BlobStore { root, compression })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Whether a blob exists for `name`
    pub async fn contains(&self, name: &str) -> bool {
        tokio::fs::try_exists(self.path_for(name))
            .await
            .unwrap_or(false)
    }

    /// Encrypt and store `plaintext` under `name`, returning the stored size
    pub async fn put(&self, key: &StoreKey, name: &str, plaintext: &[u8]) -> Result<u64> {
        let (body, compressed) = if self.compression.enabled {
            compress_or_original(plaintext, self.compression.threshold)
        } else {
            (plaintext.to_vec(), false)
        };

        let mut plain = Vec::with_capacity(1 + body.len());
        plain.push(if compressed { FLAG_COMPRESSED } else { 0 });
        plain.extend_from_slice(&body);

        let sealed = crypto::seal(key, name, &plain)?;

        let mut out = Vec::with_capacity(BLOB_MAGIC.len() + sealed.len());
        out.extend_from_slice(BLOB_MAGIC);
        out.extend_from_slice(&sealed);

        atomic_write(&self.path_for(name), &out).await?;
        debug!(name, size = out.len(), compressed, "stored blob");
        Ok(out.len() as u64)
    }

    /// Fetch and decrypt the blob stored under `name`
    ///
    /// Fails with `DecryptionFailed` if the authentication tag does not
    /// verify or the blob is malformed.
    pub async fn get(&self, key: &StoreKey, name: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.path_for(name)).await?;

        if data.len() < BLOB_MAGIC.len() || &data[..BLOB_MAGIC.len()] != BLOB_MAGIC {
            return Err(Error::DecryptionFailed { name: name.into() });
        }

        let plain = crypto::open(key, name, &data[BLOB_MAGIC.len()..])?;
        let (&flags, body) = plain
            .split_first()
            .ok_or_else(|| Error::DecryptionFailed { name: name.into() })?;

        if flags & FLAG_COMPRESSED != 0 {
            lz4_flex::decompress_size_prepended(body)
                .map_err(|_| Error::DecryptionFailed { name: name.into() })
        } else {
            Ok(body.to_vec())
        }
    }

    /// Remove the blob for `name`; missing blobs are not an error
    pub async fn delete(&self, name: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List all storage names currently on disk
    pub async fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove every blob in the store
    pub async fn clear(&self) -> Result<()> {
        for name in self.names().await? {
            self.delete(&name).await?;
        }
        Ok(())
    }
}

/// Compress data, returning the original if compression does not help
fn compress_or_original(data: &[u8], threshold: usize) -> (Vec<u8>, bool) {
    if data.len() < threshold {
        return (data.to_vec(), false);
    }
    let compressed = lz4_flex::compress_prepend_size(data);
    if compressed.len() < data.len() {
        (compressed, true)
    } else {
        (data.to_vec(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KdfConfig;
    use crate::crypto::SALT_SIZE;

    fn test_key(password: &str) -> StoreKey {
        let config = KdfConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        };
        StoreKey::from_password(password, &[9u8; SALT_SIZE], &config).unwrap()
    }

    async fn test_store(dir: &Path) -> BlobStore {
        BlobStore::open(dir.join("objects"), CompressionConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let key = test_key("pw");

        store.put(&key, "abcd1234", b"hello blob").await.unwrap();
        let content = store.get(&key, "abcd1234").await.unwrap();
        assert_eq!(content, b"hello blob");
    }

    #[tokio::test]
    async fn test_stored_bytes_are_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let key = test_key("pw");

        store
            .put(&key, "abcd1234", b"very secret plaintext content")
            .await
            .unwrap();

        let raw = std::fs::read(dir.path().join("objects").join("abcd1234")).unwrap();
        assert_eq!(&raw[..4], BLOB_MAGIC);
        let haystack = String::from_utf8_lossy(&raw);
        assert!(!haystack.contains("secret"));
    }

    #[tokio::test]
    async fn test_wrong_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;

        store.put(&test_key("pw1"), "abcd", b"data").await.unwrap();
        let result = store.get(&test_key("pw2"), "abcd").await;
        assert!(matches!(result, Err(Error::DecryptionFailed { .. })));
    }

    #[tokio::test]
    async fn test_compression_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let key = test_key("pw");

        // Highly compressible and above the threshold
        let data = vec![0x41u8; 64 * 1024];
        let stored = store.put(&key, "bigblob", &data).await.unwrap();
        assert!(stored < data.len() as u64);

        assert_eq!(store.get(&key, "bigblob").await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_delete_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let key = test_key("pw");

        store.put(&key, "abcd", b"data").await.unwrap();
        store.delete("abcd").await.unwrap();
        store.delete("abcd").await.unwrap();
        store.delete("never-existed").await.unwrap();
        assert!(!store.contains("abcd").await);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let key = test_key("pw");

        store.put(&key, "one", b"1").await.unwrap();
        store.put(&key, "two", b"2").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_blob_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let key = test_key("pw");

        store.put(&key, "abcd", b"data").await.unwrap();
        let path = dir.path().join("objects").join("abcd");
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        std::fs::write(&path, raw).unwrap();

        let result = store.get(&key, "abcd").await;
        assert!(matches!(result, Err(Error::DecryptionFailed { .. })));
    }

    #[tokio::test]
    async fn test_tampered_compressed_blob_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path()).await;
        let key = test_key("pw");

        // Compressible and above the threshold, so the compressed flag is set
        let data = vec![0x41u8; 8 * 1024];
        store.put(&key, "bigblob", &data).await.unwrap();

        // Flip the first byte after the magic; nothing past the magic is
        // malleable
        let path = dir.path().join("objects").join("bigblob");
        let mut raw = std::fs::read(&path).unwrap();
        raw[BLOB_MAGIC.len()] ^= 0xFF;
        std::fs::write(&path, raw).unwrap();

        let result = store.get(&key, "bigblob").await;
        assert!(matches!(result, Err(Error::DecryptionFailed { .. })));
    }
}
