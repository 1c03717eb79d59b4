//! Configuration management for a furtivefs store
//!
//! The configuration is persisted as `store.json` inside the working
//! directory. Salts are generated on first open and must remain stable for
//! the life of the store; regenerating them would orphan all content.

use crate::crypto;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name inside the working directory
pub const CONFIG_FILE: &str = "store.json";

/// Index file name inside the working directory
pub const INDEX_FILE: &str = "index.json";

/// Directory holding encrypted objects, one file per storage name
pub const OBJECTS_DIR: &str = "objects";

/// Default minimum size before compression is attempted
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1024;

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key derivation parameters
    pub kdf: KdfConfig,

    /// Salt for password key derivation
    #[serde(with = "hex_serde")]
    pub kdf_salt: Vec<u8>,

    /// Salt mixed into storage-name obfuscation
    #[serde(with = "hex_serde")]
    pub name_salt: Vec<u8>,

    /// Blob compression settings
    pub compression: CompressionConfig,
}

/// Argon2id parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfConfig {
    /// Memory cost in KiB
    pub argon2_memory_kib: u32,

    /// Time cost (iterations)
    pub argon2_iterations: u32,

    /// Lanes
    pub argon2_parallelism: u32,
}

/// Blob compression settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Enable LZ4 compression of plaintext before encryption
    pub enabled: bool,

    /// Minimum plaintext size to attempt compression (bytes)
    pub threshold: usize,
}

impl Default for KdfConfig {
    fn default() -> Self {
        KdfConfig {
            argon2_memory_kib: 65536, // 64 MiB
            argon2_iterations: 3,
            argon2_parallelism: 4,
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            enabled: true,
            threshold: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            kdf: KdfConfig::default(),
            kdf_salt: crypto::generate_salt().to_vec(),
            name_salt: crypto::generate_salt().to_vec(),
            compression: CompressionConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Default working directory for a store
    pub fn default_working_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("furtivefs")
    }

    /// Load configuration from a file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| Error::Config(format!("failed to read config file: {}", e)))?;

        let config: StoreConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        crate::blob::atomic_write(path.as_ref(), content.as_bytes()).await
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.kdf_salt.len() < crypto::SALT_SIZE {
            return Err(Error::Config("kdf_salt is too short".to_string()));
        }
        if self.name_salt.len() < crypto::SALT_SIZE {
            return Err(Error::Config("name_salt is too short".to_string()));
        }
        if self.kdf.argon2_memory_kib == 0 || self.kdf.argon2_iterations == 0 {
            return Err(Error::Config(
                "Argon2 parameters must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hex serialization for byte arrays
mod hex_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = StoreConfig::default();
        config.save(&path).await.unwrap();

        let loaded = StoreConfig::load(&path).await.unwrap();
        assert_eq!(loaded.kdf_salt, config.kdf_salt);
        assert_eq!(loaded.name_salt, config.name_salt);
        assert_eq!(loaded.kdf.argon2_memory_kib, config.kdf.argon2_memory_kib);
    }

    #[test]
    fn test_default_salts_differ() {
        let config = StoreConfig::default();
        assert_ne!(config.kdf_salt, config.name_salt);
    }

    #[test]
    fn test_validate_rejects_short_salt() {
        let mut config = StoreConfig::default();
        config.kdf_salt = vec![0u8; 4];
        assert!(config.validate().is_err());
    }
}
