//! Storage-name obfuscation
//!
//! Maps a real file or directory name to a stable, opaque storage name that
//! leaks neither the original name nor its extension. The mapping is one-way:
//! decoding always goes through the index, never through this codec.

use blake3::Hasher;

/// Number of hash bytes kept for a storage name (rendered as hex)
const NAME_BYTES: usize = 16;

/// One-way codec from real names to opaque storage names
#[derive(Debug, Clone)]
pub struct ObfuscationCodec {
    salt: Vec<u8>,
}

impl ObfuscationCodec {
    /// Create a codec salted with the store's name salt
    pub fn new(salt: &[u8]) -> Self {
        ObfuscationCodec {
            salt: salt.to_vec(),
        }
    }

    /// Encode a real name into an opaque storage name
    ///
    /// `context` is the node's location (scope, project, parent path), so the
    /// same file name in different places yields different storage names.
    /// Identical inputs always yield the same output.
    pub fn encode(&self, context: &str, real_name: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(&self.salt);
        // Length-prefix the context so (ctx="a", name="b/c") and
        // (ctx="a/b", name="c") cannot collide.
        hasher.update(&(context.len() as u64).to_le_bytes());
        hasher.update(context.as_bytes());
        hasher.update(real_name.as_bytes());

        let hash = hasher.finalize();
        hex::encode(&hash.as_bytes()[..NAME_BYTES])
    }

    /// Append a disambiguating suffix for the rare collision case
    pub fn disambiguate(name: &str, attempt: u32) -> String {
        format!("{}-{}", name, attempt)
    }
}
