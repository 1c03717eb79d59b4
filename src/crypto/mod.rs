//! Cryptographic primitives
//!
//! Key derivation (Argon2id) and authenticated encryption (AES-256-GCM).
//! The derived key lives only for the duration of an operation and is
//! zeroized on drop; it is never persisted.

mod cipher;
mod kdf;

pub use cipher::{open, seal, NONCE_SIZE, TAG_SIZE};
pub use kdf::{generate_salt, StoreKey};

/// Symmetric key size in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Salt size in bytes for key derivation and name obfuscation
pub const SALT_SIZE: usize = 16;
