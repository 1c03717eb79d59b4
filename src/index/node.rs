//! File tree nodes
//!
//! Each pushed file and directory is represented by a [`FileNode`] carrying
//! its real name, its opaque storage name, and (for directories) ordered
//! children. Within one parent, real names are unique; storage names are
//! unique across the whole store.

use serde::{Deserialize, Serialize};

/// Node type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file, backed by one blob
    File,
    /// Directory; has no blob
    Directory,
}

/// A file or directory in a pushed project tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    /// Original relative path segment
    pub real_name: String,
    /// Opaque identifier addressing the blob store entry
    pub storage_name: String,
    /// File size in bytes; for directories, the sum of all descendants
    pub size: u64,
    /// Node type
    pub kind: NodeKind,
    /// Ordered children (directories only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    /// Create a file node
    pub fn file(real_name: String, storage_name: String, size: u64) -> Self {
        FileNode {
            real_name,
            storage_name,
            size,
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    /// Create an empty directory node
    pub fn directory(real_name: String, storage_name: String) -> Self {
        FileNode {
            real_name,
            storage_name,
            size: 0,
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Check if this is a regular file
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Append a child, keeping the directory's aggregate size current
    pub fn add_child(&mut self, child: FileNode) {
        self.size += child.size;
        self.children.push(child);
    }

    /// Find a direct child by real name
    pub fn child(&self, real_name: &str) -> Option<&FileNode> {
        self.children.iter().find(|c| c.real_name == real_name)
    }

    /// Number of files in this subtree
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(FileNode::file_count).sum(),
        }
    }

    /// Collect the storage names of every file in this subtree
    pub fn storage_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_storage_names(&mut names);
        names
    }

    fn collect_storage_names(&self, names: &mut Vec<String>) {
        if self.is_file() {
            names.push(self.storage_name.clone());
        }
        for child in &self.children {
            child.collect_storage_names(names);
        }
    }
}
