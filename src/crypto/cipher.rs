//! Authenticated encryption using AES-256-GCM
//!
//! Wire format: nonce (12 bytes) || ciphertext || tag (16 bytes).
//! The blob's storage name is bound as additional authenticated data, so a
//! blob cannot be opened under a different name than it was sealed with.

use crate::crypto::StoreKey;
use crate::error::{Error, Result};
use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};

/// Nonce size in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

fn aead_key(key: &StoreKey) -> Result<LessSafeKey> {
    let unbound = UnboundKey::new(&AES_256_GCM, key.bytes())
        .map_err(|_| Error::Crypto("invalid key length for AES-256-GCM".into()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` under `key`, binding `name` as AAD
///
/// A fresh random nonce is generated per call and prepended to the output.
pub fn seal(key: &StoreKey, name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    let sealing = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    sealing
        .seal_in_place_append_tag(nonce, Aad::from(name.as_bytes()), &mut in_out)
        .map_err(|_| Error::Crypto("encryption failed".into()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + in_out.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&in_out);
    Ok(out)
}

/// Decrypt data previously produced by [`seal`] for the same `name`
///
/// Fails with `DecryptionFailed` if the tag does not verify: wrong password,
/// corrupted content, or a blob addressed under the wrong name. This is the
/// sole password-correctness signal the engine surfaces.
pub fn open(key: &StoreKey, name: &str, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::DecryptionFailed { name: name.into() });
    }

    let opening = aead_key(key)?;
    let nonce = Nonce::try_assume_unique_for_key(&data[..NONCE_SIZE])
        .map_err(|_| Error::DecryptionFailed { name: name.into() })?;

    let mut in_out = data[NONCE_SIZE..].to_vec();
    let plaintext = opening
        .open_in_place(nonce, Aad::from(name.as_bytes()), &mut in_out)
        .map_err(|_| Error::DecryptionFailed { name: name.into() })?;

    Ok(plaintext.to_vec())
}
