//! Project restore
//!
//! Reads a project's tree from the index, decrypts each blob, and
//! reconstructs the original directory under a target path. The destination
//! must not already contain the project root; nothing is merged or
//! overwritten, and a restore that fails mid-tree removes what it wrote.

use crate::blob::BlobStore;
use crate::crypto::StoreKey;
use crate::error::{Error, Result};
use crate::index::{FileNode, TreeIndex};
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options for [`crate::FurtiveStore::restore_project`]
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Name for the restored root directory; defaults to the project name
    pub rename: Option<String>,
}

/// Summary of a completed restore
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Where the project root was written
    pub root: PathBuf,
    /// Number of files restored
    pub files: usize,
    /// Total plaintext bytes written
    pub bytes: u64,
}

pub(crate) struct ProjectRestorer<'a> {
    pub index: &'a TreeIndex,
    pub blobs: &'a BlobStore,
}

impl<'a> ProjectRestorer<'a> {
    pub async fn restore(
        &self,
        key: &StoreKey,
        scope: &str,
        project: &str,
        target: &Path,
        opts: &RestoreOptions,
    ) -> Result<RestoreReport> {
        let entry = self.index.lookup(scope, project)?;

        let root_name = opts.rename.as_deref().unwrap_or(&entry.root.real_name);
        let root_path = target.join(root_name);

        if tokio::fs::try_exists(&root_path).await? {
            return Err(Error::DestinationConflict(root_path));
        }

        info!(%scope, %project, target = %root_path.display(), "restoring project");

        tokio::fs::create_dir_all(target).await?;

        let mut report = RestoreReport {
            root: root_path.clone(),
            files: 0,
            bytes: 0,
        };
        if let Err(e) = self
            .restore_node(key, &entry.root, root_path.clone(), &mut report)
            .await
        {
            // Best-effort: do not leave a partial tree at the destination
            if let Err(cleanup) = tokio::fs::remove_dir_all(&root_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        path = %root_path.display(),
                        error = %cleanup,
                        "failed to remove partially restored tree"
                    );
                }
            }
            return Err(e);
        }

        info!(%scope, %project, files = report.files, "restore complete");
        Ok(report)
    }

    fn restore_node<'b>(
        &'b self,
        key: &'b StoreKey,
        node: &'b FileNode,
        path: PathBuf,
        report: &'b mut RestoreReport,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            if node.is_dir() {
                tokio::fs::create_dir(&path).await?;
                for child in &node.children {
                    let child_path = path.join(&child.real_name);
                    self.restore_node(key, child, child_path, report).await?;
                }
            } else {
                let content = self.blobs.get(key, &node.storage_name).await?;
                tokio::fs::write(&path, &content).await?;
                report.files += 1;
                report.bytes += content.len() as u64;
            }
            Ok(())
        })
    }
}
