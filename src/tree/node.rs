// Listing tree node types

use serde::Serialize;

/// A single entry of the listing tree.
///
/// Serialized with an internal `type` tag:
/// - `{"type":"directory","name":..,"path":..,"children":[..]}`
/// - `{"type":"file","name":..,"path":..}`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Directory {
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        name: String,
        path: String,
    },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. } | Self::File { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Directory { path, .. } | Self::File { path, .. } => path,
        }
    }

    /// Children of a directory node; files have none
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Directory { children, .. } => children,
            Self::File { .. } => &[],
        }
    }

    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Count file nodes in this subtree
    pub fn file_count(&self) -> usize {
        match self {
            Self::Directory { children, .. } => children.iter().map(Self::file_count).sum(),
            Self::File { .. } => 1,
        }
    }

    /// Count directory nodes in this subtree, including self
    pub fn directory_count(&self) -> usize {
        match self {
            Self::Directory { children, .. } => {
                1 + children.iter().map(Self::directory_count).sum::<usize>()
            }
            Self::File { .. } => 0,
        }
    }
}
