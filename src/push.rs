//! Project push
//!
//! Walks a source directory depth-first, applies ignore globs, encrypts file
//! content into the blob store, and commits the resulting tree to the index.
//! The commit is all-or-nothing per project: on any failure the previous
//! committed state stays intact and blobs written by the failed push are
//! removed. A referenced blob is never overwritten in place; name clashes are
//! resolved with a disambiguating suffix and the superseded blobs are deleted
//! only after the index commit.

use crate::blob::BlobStore;
use crate::codec::ObfuscationCodec;
use crate::crypto::StoreKey;
use crate::error::{Error, Result};
use crate::index::{FileNode, TreeIndex};
use futures::future::BoxFuture;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Scope used when a push does not name one
pub const DEFAULT_SCOPE: &str = "default";

/// Options for [`crate::FurtiveStore::push_project`]
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Target scope; defaults to [`DEFAULT_SCOPE`]
    pub scope: Option<String>,
    /// Project name override; defaults to the source directory name
    pub rename: Option<String>,
    /// Glob patterns matched against paths relative to the source; matching
    /// entries and their subtrees are skipped
    pub ignore: Vec<String>,
}

/// Summary of a completed push
#[derive(Debug, Clone)]
pub struct PushReport {
    /// Scope the project landed in
    pub scope: String,
    /// Effective project name
    pub project: String,
    /// Number of files stored
    pub files: usize,
    /// Total plaintext bytes read
    pub bytes: u64,
    /// Total encrypted bytes written
    pub stored_bytes: u64,
}

pub(crate) struct ProjectPusher<'a> {
    pub index: &'a mut TreeIndex,
    pub blobs: &'a BlobStore,
    pub codec: &'a ObfuscationCodec,
}

struct WalkState<'k> {
    key: &'k StoreKey,
    matcher: Gitignore,
    /// Codec context shared by every node of this push (scope/project)
    name_context: String,
    /// Storage names that must not be reused: referenced by the committed
    /// index or allocated earlier in this push
    used: HashSet<String>,
    /// Blobs written by this push, for cleanup on failure
    written: Vec<String>,
    files: usize,
    bytes: u64,
    stored_bytes: u64,
}

impl<'a> ProjectPusher<'a> {
    pub async fn push(
        &mut self,
        key: &StoreKey,
        source: &Path,
        opts: &PushOptions,
    ) -> Result<PushReport> {
        let meta = match tokio::fs::metadata(source).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::SourceNotFound(source.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(Error::SourceNotFound(source.to_path_buf()));
        }

        let project = match &opts.rename {
            Some(name) => name.clone(),
            None => source
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "cannot derive a project name from {}",
                        source.display()
                    ))
                })?,
        };
        let scope = opts
            .scope
            .clone()
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        info!(%scope, %project, source = %source.display(), "pushing project");

        let mut state = WalkState {
            key,
            matcher: build_matcher(source, &opts.ignore)?,
            name_context: format!("{}/{}", scope, project),
            used: self.index.referenced_names().into_iter().collect(),
            written: Vec::new(),
            files: 0,
            bytes: 0,
            stored_bytes: 0,
        };

        let walked = self
            .walk_dir(&mut state, source.to_path_buf(), String::new(), project.clone())
            .await;

        let root = match walked {
            Ok(root) => root,
            Err(e) => {
                self.discard_written(&state.written).await;
                return Err(e);
            }
        };

        // Commit: index rename is the atomicity point. Blobs written above
        // are unreferenced until this succeeds.
        let orphans = self.index.upsert_project(&scope, &project, root);
        if let Err(e) = self.index.save().await {
            self.discard_written(&state.written).await;
            if let Err(reload_err) = self.index.reload().await {
                warn!(error = %reload_err, "failed to reload index after aborted push");
            }
            return Err(e);
        }

        // Old blobs superseded by this push; deletion is idempotent, so a
        // crash here only leaves orphans for the next sweep.
        for name in &orphans {
            if let Err(e) = self.blobs.delete(name).await {
                warn!(name = %name, error = %e, "failed to delete superseded blob");
            }
        }

        info!(
            %scope,
            %project,
            files = state.files,
            bytes = state.bytes,
            "push committed"
        );

        Ok(PushReport {
            scope,
            project,
            files: state.files,
            bytes: state.bytes,
            stored_bytes: state.stored_bytes,
        })
    }

    /// Best-effort removal of blobs written by a failed push
    async fn discard_written(&self, written: &[String]) {
        for name in written {
            if let Err(e) = self.blobs.delete(name).await {
                warn!(name = %name, error = %e, "failed to remove blob of aborted push");
            }
        }
    }

    /// Pick a free storage name, disambiguating on collision
    async fn allocate_name(&self, state: &mut WalkState<'_>, rel_path: &str) -> String {
        let base = self.codec.encode(&state.name_context, rel_path);
        let mut candidate = base.clone();
        let mut attempt = 0u32;
        while state.used.contains(&candidate) || self.blobs.contains(&candidate).await {
            attempt += 1;
            candidate = ObfuscationCodec::disambiguate(&base, attempt);
        }
        state.used.insert(candidate.clone());
        candidate
    }

    fn walk_dir<'b>(
        &'b self,
        state: &'b mut WalkState<'_>,
        dir: PathBuf,
        rel: String,
        real_name: String,
    ) -> BoxFuture<'b, Result<FileNode>> {
        Box::pin(async move {
            let storage_name = self.allocate_name(state, &rel).await;
            let mut node = FileNode::directory(real_name, storage_name);

            // Deterministic child order: lexicographic by name
            let mut entries = Vec::new();
            let mut reader = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = reader.next_entry().await? {
                entries.push(entry);
            }
            entries.sort_by_key(|e| e.file_name());

            for entry in entries {
                let raw_name = entry.file_name();
                let name = match raw_name.to_str() {
                    Some(name) => name.to_owned(),
                    None => {
                        // Lossy conversion would not round-trip on restore
                        warn!(path = %entry.path().display(), "skipping non-UTF-8 file name");
                        continue;
                    }
                };
                let rel_child = if rel.is_empty() {
                    name.clone()
                } else {
                    format!("{}/{}", rel, name)
                };
                let file_type = entry.file_type().await?;

                if state
                    .matcher
                    .matched(Path::new(&rel_child), file_type.is_dir())
                    .is_ignore()
                {
                    debug!(path = %rel_child, "skipping ignored entry");
                    continue;
                }

                if file_type.is_dir() {
                    let child = self
                        .walk_dir(state, entry.path(), rel_child, name)
                        .await?;
                    node.add_child(child);
                } else if file_type.is_file() {
                    let child = self.push_file(state, &entry.path(), &rel_child, name).await?;
                    node.add_child(child);
                } else {
                    // Symlinks and special files are not representable
                    warn!(path = %rel_child, "skipping non-regular file");
                }
            }

            Ok(node)
        })
    }

    async fn push_file(
        &self,
        state: &mut WalkState<'_>,
        path: &Path,
        rel: &str,
        real_name: String,
    ) -> Result<FileNode> {
        let content = tokio::fs::read(path).await?;
        let storage_name = self.allocate_name(state, rel).await;

        let stored = self.blobs.put(state.key, &storage_name, &content).await?;
        state.written.push(storage_name.clone());
        state.files += 1;
        state.bytes += content.len() as u64;
        state.stored_bytes += stored;

        Ok(FileNode::file(real_name, storage_name, content.len() as u64))
    }
}

/// Build the ignore matcher from user-supplied globs
fn build_matcher(source: &Path, globs: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(source);
    for glob in globs {
        builder
            .add_line(None, glob)
            .map_err(|e| Error::IgnorePattern(format!("{}: {}", glob, e)))?;
    }
    builder
        .build()
        .map_err(|e| Error::IgnorePattern(e.to_string()))
}
