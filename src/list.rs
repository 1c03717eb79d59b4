//! Listing projection for presentation
//!
//! Builds presentation entries from index metadata alone. Listing never
//! opens the blob store or needs a key, so it is available before the
//! correct password is known and can never fail with `DecryptionFailed`.

use crate::index::{FileNode, NodeKind, TreeIndex};
use chrono::{DateTime, Utc};

/// One row of a listing
#[derive(Debug, Clone)]
pub struct ListEntry {
    /// Original name (scope, project, or file name)
    pub real_name: String,
    /// Opaque storage name; for scope rows, the scope name itself
    pub name: String,
    /// Plaintext size in bytes (aggregated for directories)
    pub size: u64,
    /// Entry type
    pub kind: NodeKind,
    /// When the project was pushed (project rows only)
    pub pushed_at: Option<DateTime<Utc>>,
    /// Nested entries, present when the listing descends
    pub children: Option<Vec<ListEntry>>,
}

pub(crate) struct TreeLister<'a> {
    pub index: &'a TreeIndex,
}

impl<'a> TreeLister<'a> {
    /// List scopes (no argument) or a scope's projects with their full trees
    ///
    /// An absent scope yields an empty listing, never an error.
    pub fn list(&self, scope: Option<&str>) -> Vec<ListEntry> {
        match scope {
            None => self.scopes(),
            Some(scope) => self.projects(scope, None),
        }
    }

    /// List a scope's projects with one additional level of children
    pub fn list_detail(&self, scope: &str) -> Vec<ListEntry> {
        self.projects(scope, Some(1))
    }

    fn scopes(&self) -> Vec<ListEntry> {
        self.index
            .scope_names()
            .map(|scope| {
                let size = self
                    .index
                    .projects(scope)
                    .map(|projects| projects.values().map(|p| p.size()).sum())
                    .unwrap_or(0);
                ListEntry {
                    real_name: scope.clone(),
                    name: scope.clone(),
                    size,
                    kind: NodeKind::Directory,
                    pushed_at: None,
                    children: None,
                }
            })
            .collect()
    }

    fn projects(&self, scope: &str, depth: Option<usize>) -> Vec<ListEntry> {
        let Some(projects) = self.index.projects(scope) else {
            return Vec::new();
        };
        projects
            .values()
            .map(|project| {
                let mut entry = project_entry(&project.root, depth);
                entry.pushed_at = Some(project.pushed_at);
                entry
            })
            .collect()
    }
}

/// Project a storage node into a presentation entry
///
/// `depth` limits descent: `None` is unbounded, `Some(0)` stops here.
fn project_entry(node: &FileNode, depth: Option<usize>) -> ListEntry {
    let children = match (node.kind, depth) {
        (NodeKind::File, _) => None,
        (NodeKind::Directory, Some(0)) => None,
        (NodeKind::Directory, _) => {
            let next = depth.map(|d| d - 1);
            Some(
                node.children
                    .iter()
                    .map(|child| project_entry(child, next))
                    .collect(),
            )
        }
    };

    ListEntry {
        real_name: node.real_name.clone(),
        name: node.storage_name.clone(),
        size: node.size,
        kind: node.kind,
        pushed_at: None,
        children,
    }
}
