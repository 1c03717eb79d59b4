//! The store facade
//!
//! [`FurtiveStore`] is an explicit value rooted at a working directory; there
//! is no process-wide instance. Keys are derived per operation and passed
//! explicitly, never held as session state. The caller serializes mutating
//! operations (they take `&mut self`); listings are read-only.

use crate::blob::BlobStore;
use crate::codec::ObfuscationCodec;
use crate::config::{StoreConfig, CONFIG_FILE, INDEX_FILE, OBJECTS_DIR};
use crate::crypto::StoreKey;
use crate::error::Result;
use crate::index::TreeIndex;
use crate::list::{ListEntry, TreeLister};
use crate::push::{ProjectPusher, PushOptions, PushReport};
use crate::restore::{ProjectRestorer, RestoreOptions, RestoreReport};
use crate::scope::ScopeManager;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A password-protected, obfuscated project store
#[derive(Debug)]
pub struct FurtiveStore {
    working_dir: PathBuf,
    config: StoreConfig,
    codec: ObfuscationCodec,
    index: TreeIndex,
    blobs: BlobStore,
}

impl FurtiveStore {
    /// Open the store at `working_dir`, initializing it on first use
    pub async fn open<P: AsRef<Path>>(working_dir: P) -> Result<Self> {
        Self::open_with_config(working_dir, StoreConfig::default()).await
    }

    /// Open the store, using `config` if the directory is uninitialized
    ///
    /// An already-initialized store keeps its persisted configuration; the
    /// argument only seeds a fresh one.
    pub async fn open_with_config<P: AsRef<Path>>(
        working_dir: P,
        config: StoreConfig,
    ) -> Result<Self> {
        let working_dir = working_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&working_dir).await?;

        let config_path = working_dir.join(CONFIG_FILE);
        let config = if tokio::fs::try_exists(&config_path).await? {
            StoreConfig::load(&config_path).await?
        } else {
            config.validate()?;
            config.save(&config_path).await?;
            config
        };

        let codec = ObfuscationCodec::new(&config.name_salt);
        let blobs = BlobStore::open(working_dir.join(OBJECTS_DIR), config.compression.clone())
            .await?;
        let index = TreeIndex::load(working_dir.join(INDEX_FILE)).await?;

        let store = FurtiveStore {
            working_dir,
            config,
            codec,
            index,
            blobs,
        };
        store.sweep_orphans().await?;
        Ok(store)
    }

    /// Working directory this store is rooted at
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Derive the session key for a password
    ///
    /// Fails with `InvalidPassword` only for a malformed (empty) password; a
    /// wrong password is detected later as `DecryptionFailed` on restore.
    pub fn derive_key(&self, password: &str) -> Result<StoreKey> {
        StoreKey::from_password(password, &self.config.kdf_salt, &self.config.kdf)
    }

    /// Push a source directory as a project
    pub async fn push_project(
        &mut self,
        key: &StoreKey,
        source: &Path,
        opts: &PushOptions,
    ) -> Result<PushReport> {
        let mut pusher = ProjectPusher {
            index: &mut self.index,
            blobs: &self.blobs,
            codec: &self.codec,
        };
        pusher.push(key, source, opts).await
    }

    /// Restore a project under `target`
    pub async fn restore_project(
        &self,
        key: &StoreKey,
        scope: &str,
        project: &str,
        target: &Path,
        opts: &RestoreOptions,
    ) -> Result<RestoreReport> {
        let restorer = ProjectRestorer {
            index: &self.index,
            blobs: &self.blobs,
        };
        restorer.restore(key, scope, project, target, opts).await
    }

    /// List scopes, or one scope's projects with their full trees
    ///
    /// Uses index metadata only; no key required.
    pub fn ls(&self, scope: Option<&str>) -> Vec<ListEntry> {
        TreeLister { index: &self.index }.list(scope)
    }

    /// List a scope's projects with one level of children
    pub fn ls_detail(&self, scope: &str) -> Vec<ListEntry> {
        TreeLister { index: &self.index }.list_detail(scope)
    }

    /// Remove one project
    pub async fn rm_project(&mut self, scope: &str, project: &str) -> Result<()> {
        self.manager().rm_project(scope, project).await
    }

    /// Remove a scope and every project under it
    pub async fn rm_scope(&mut self, scope: &str) -> Result<()> {
        self.manager().rm_scope(scope).await
    }

    /// Wipe the store; irreversible
    pub async fn clean(&mut self) -> Result<()> {
        self.manager().clean().await
    }

    fn manager(&mut self) -> ScopeManager<'_> {
        ScopeManager {
            index: &mut self.index,
            blobs: &self.blobs,
        }
    }

    /// Delete blobs left unreferenced by an interrupted earlier operation
    async fn sweep_orphans(&self) -> Result<()> {
        let referenced = self.index.referenced_names();
        let mut swept = 0usize;
        for name in self.blobs.names().await? {
            if !referenced.contains(&name) {
                if let Err(e) = self.blobs.delete(&name).await {
                    warn!(name = %name, error = %e, "failed to sweep orphaned blob");
                } else {
                    swept += 1;
                }
            }
        }
        if swept > 0 {
            debug!(swept, "removed orphaned blobs");
        }
        Ok(())
    }
}
