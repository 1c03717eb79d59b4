//! Tree index module
//!
//! Records, per scope and project, the real directory hierarchy and the
//! mapping from real names to opaque storage names. The index never holds
//! file content; content lives encrypted in the blob store.

mod node;
mod tree;

pub use node::{FileNode, NodeKind};
pub use tree::{Project, TreeIndex};
