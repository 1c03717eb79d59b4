//! Scope and project removal
//!
//! Removal always commits the index first and deletes blobs second, so a
//! crash can never leave the index pointing at missing content. Blob
//! deletion is idempotent; anything missed is picked up by the orphan sweep.

use crate::blob::BlobStore;
use crate::error::Result;
use crate::index::TreeIndex;
use tracing::{info, warn};

pub(crate) struct ScopeManager<'a> {
    pub index: &'a mut TreeIndex,
    pub blobs: &'a BlobStore,
}

impl<'a> ScopeManager<'a> {
    /// Remove one project and the blobs only it references
    pub async fn rm_project(&mut self, scope: &str, project: &str) -> Result<()> {
        let names = self.index.remove_project(scope, project)?;
        self.commit_and_delete(names).await?;
        info!(%scope, %project, "removed project");
        Ok(())
    }

    /// Remove a whole scope and everything under it
    pub async fn rm_scope(&mut self, scope: &str) -> Result<()> {
        let names = self.index.remove_scope(scope)?;
        self.commit_and_delete(names).await?;
        info!(%scope, "removed scope");
        Ok(())
    }

    /// Wipe the store: all scopes, all projects, all blobs
    pub async fn clean(&mut self) -> Result<()> {
        self.index.clear();
        if let Err(e) = self.index.save().await {
            self.index.reload().await.ok();
            return Err(e);
        }
        self.blobs.clear().await?;
        info!("store cleaned");
        Ok(())
    }

    async fn commit_and_delete(&mut self, names: Vec<String>) -> Result<()> {
        if let Err(e) = self.index.save().await {
            self.index.reload().await.ok();
            return Err(e);
        }
        for name in names {
            if let Err(e) = self.blobs.delete(&name).await {
                warn!(name = %name, error = %e, "failed to delete blob");
            }
        }
        Ok(())
    }
}
