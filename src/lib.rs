//! furtivefs - Password-protected local store for project trees
//!
//! This library ingests a project directory, obfuscates file identities,
//! encrypts content under a password-derived key, and reconstructs the
//! original tree on demand. Projects are organized under a two-level
//! scope → project namespace rooted at a working directory.

pub mod blob;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod index;
pub mod list;
pub mod push;
pub mod restore;
mod scope;
pub mod store;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use store::FurtiveStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::crypto::StoreKey;
    pub use crate::error::{Error, Result};
    pub use crate::index::{FileNode, NodeKind};
    pub use crate::list::ListEntry;
    pub use crate::push::{PushOptions, PushReport};
    pub use crate::restore::{RestoreOptions, RestoreReport};
    pub use crate::store::FurtiveStore;
}
