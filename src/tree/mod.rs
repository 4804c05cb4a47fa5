//! Directory tree module
//!
//! Walks the traversal root and turns it into the JSON tree returned by the
//! listing endpoint. Only directories and files accepted by the extension
//! filter make it into the tree.

mod builder;
mod filter;
mod node;

pub use builder::{Listing, TraversalError, TreeBuilder};
pub use filter::ExtensionFilter;
pub use node::TreeNode;
