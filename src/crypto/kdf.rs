//! Key derivation using Argon2id
//!
//! The same password and salt always yield the same key, so previously
//! pushed content stays decryptable. Password correctness is never checked
//! here; a wrong password only surfaces later when a blob fails to open.

use crate::config::KdfConfig;
use crate::crypto::{KEY_SIZE, SALT_SIZE};
use crate::error::{Error, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

/// Session key derived from a password (zeroized on drop)
#[derive(Clone)]
pub struct StoreKey {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl StoreKey {
    /// Derive a key from a password and a store-level salt
    ///
    /// Fails with `InvalidPassword` only if the password is empty; it does
    /// not verify the password against stored data.
    pub fn from_password(password: &str, salt: &[u8], config: &KdfConfig) -> Result<Self> {
        if password.is_empty() {
            return Err(Error::InvalidPassword("password must not be empty".into()));
        }
        if salt.len() < SALT_SIZE {
            return Err(Error::Crypto(format!(
                "salt too short: {} bytes, need {}",
                salt.len(),
                SALT_SIZE
            )));
        }

        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| Error::Crypto(format!("invalid Argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        argon2
            .hash_password_into(password.as_bytes(), &salt[..SALT_SIZE], key.as_mut())
            .map_err(|e| Error::Crypto(format!("key derivation failed: {}", e)))?;

        Ok(StoreKey { key })
    }

    /// Raw key bytes
    pub(crate) fn bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.write_str("StoreKey(..)")
    }
}

/// Generate a random salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> KdfConfig {
        KdfConfig {
            argon2_memory_kib: 1024, // Low for testing
            argon2_iterations: 1,
            argon2_parallelism: 1,
        }
    }

    #[test]
    fn test_same_password_same_key() {
        let config = test_config();
        let salt = [7u8; SALT_SIZE];

        let key1 = StoreKey::from_password("pw1", &salt, &config).unwrap();
        let key2 = StoreKey::from_password("pw1", &salt, &config).unwrap();

        assert_eq!(key1.bytes(), key2.bytes());
    }

    #[test]
    fn test_different_passwords_different_keys() {
        let config = test_config();
        let salt = [7u8; SALT_SIZE];

        let key1 = StoreKey::from_password("pw1", &salt, &config).unwrap();
        let key2 = StoreKey::from_password("pw2", &salt, &config).unwrap();

        assert_ne!(key1.bytes(), key2.bytes());
    }

    #[test]
    fn test_empty_password_rejected() {
        let config = test_config();
        let salt = [7u8; SALT_SIZE];

        let result = StoreKey::from_password("", &salt, &config);
        assert!(matches!(result, Err(Error::InvalidPassword(_))));
    }

    #[test]
    fn test_short_salt_rejected() {
        let config = test_config();
        let result = StoreKey::from_password("pw", &[0u8; 4], &config);
        assert!(result.is_err());
    }
}
