//! Persistent scope → project → tree forest
//!
//! The index is the commit point of every mutating operation: blobs are
//! written first, then the index is saved atomically. A project is either
//! fully visible (index committed) or not visible at all.

use crate::blob::atomic_write;
use crate::error::{Error, Result};
use crate::index::FileNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Index format version
const FORMAT_VERSION: u32 = 1;

/// A pushed project: its tree plus push metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Root of the pushed tree; `real_name` is the project name
    pub root: FileNode,
    /// When this project was last pushed
    pub pushed_at: DateTime<Utc>,
}

impl Project {
    /// Total plaintext size of all files
    pub fn size(&self) -> u64 {
        self.root.size
    }

    /// Number of files
    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }
}

/// On-disk shape of the index
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    scopes: BTreeMap<String, BTreeMap<String, Project>>,
}

/// The scope → project → FileNode forest, persisted as JSON
#[derive(Debug)]
pub struct TreeIndex {
    path: PathBuf,
    scopes: BTreeMap<String, BTreeMap<String, Project>>,
}

impl TreeIndex {
    /// Load the index from `path`; a missing file yields an empty index
    pub async fn load(path: PathBuf) -> Result<Self> {
        let scopes = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let file: IndexFile = serde_json::from_str(&content)
                    .map_err(|e| Error::Config(format!("failed to parse index: {}", e)))?;
                if file.version != FORMAT_VERSION {
                    return Err(Error::Config(format!(
                        "unsupported index version {}",
                        file.version
                    )));
                }
                file.scopes
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(TreeIndex { path, scopes })
    }

    /// Discard in-memory state and re-read the last committed index
    pub async fn reload(&mut self) -> Result<()> {
        let fresh = TreeIndex::load(self.path.clone()).await?;
        self.scopes = fresh.scopes;
        Ok(())
    }

    /// Persist the index atomically
    pub async fn save(&self) -> Result<()> {
        let file = IndexFile {
            version: FORMAT_VERSION,
            scopes: self.scopes.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        atomic_write(&self.path, content.as_bytes()).await
    }

    /// Replace (or create) a project's subtree
    ///
    /// Returns the storage names referenced by the previous subtree but not
    /// by the new one; the caller deletes those blobs after committing.
    pub fn upsert_project(&mut self, scope: &str, name: &str, root: FileNode) -> Vec<String> {
        let projects = self.scopes.entry(scope.to_string()).or_default();

        let new_names: BTreeSet<String> = root.storage_names().into_iter().collect();
        let orphans = match projects.get(name) {
            Some(old) => old
                .root
                .storage_names()
                .into_iter()
                .filter(|n| !new_names.contains(n))
                .collect(),
            None => Vec::new(),
        };

        projects.insert(
            name.to_string(),
            Project {
                root,
                pushed_at: Utc::now(),
            },
        );
        orphans
    }

    /// Look up a project
    pub fn lookup(&self, scope: &str, name: &str) -> Result<&Project> {
        self.scopes
            .get(scope)
            .and_then(|projects| projects.get(name))
            .ok_or_else(|| Error::project_not_found(scope, name))
    }

    /// Remove a project, returning the storage names it referenced
    ///
    /// Empty scopes are pruned so they no longer appear in listings.
    pub fn remove_project(&mut self, scope: &str, name: &str) -> Result<Vec<String>> {
        let projects = self
            .scopes
            .get_mut(scope)
            .ok_or_else(|| Error::project_not_found(scope, name))?;
        let project = projects
            .remove(name)
            .ok_or_else(|| Error::project_not_found(scope, name))?;
        if projects.is_empty() {
            self.scopes.remove(scope);
        }
        Ok(project.root.storage_names())
    }

    /// Remove a whole scope, returning every storage name it referenced
    pub fn remove_scope(&mut self, scope: &str) -> Result<Vec<String>> {
        let projects = self
            .scopes
            .remove(scope)
            .ok_or_else(|| Error::scope_not_found(scope))?;
        Ok(projects
            .values()
            .flat_map(|p| p.root.storage_names())
            .collect())
    }

    /// Drop every scope and project
    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    /// Whether the index holds no projects
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scope names in order
    pub fn scope_names(&self) -> impl Iterator<Item = &String> {
        self.scopes.keys()
    }

    /// Projects of one scope, in order; `None` if the scope is absent
    pub fn projects(&self, scope: &str) -> Option<&BTreeMap<String, Project>> {
        self.scopes.get(scope)
    }

    /// Every storage name referenced by any project
    pub fn referenced_names(&self) -> BTreeSet<String> {
        self.scopes
            .values()
            .flat_map(|projects| projects.values())
            .flat_map(|p| p.root.storage_names())
            .collect()
    }
}
