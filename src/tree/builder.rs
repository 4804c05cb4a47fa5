//! Directory tree builder
//!
//! Recursive walk of the traversal root. Failures are contained per
//! directory level: an unreadable directory contributes an empty `children`
//! list and a [`TraversalError`], and the walk carries on with its siblings.

use super::{ExtensionFilter, TreeNode};
use crate::logger;
use std::fmt;
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Component, Path, PathBuf};

/// A directory level, or a single entry, that could not be listed
#[derive(Debug)]
pub struct TraversalError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for TraversalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error reading {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for TraversalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Result of a walk: the tree plus every failure met on the way
#[derive(Debug, Default)]
pub struct Listing {
    pub nodes: Vec<TreeNode>,
    pub errors: Vec<TraversalError>,
}

impl Listing {
    pub fn file_count(&self) -> usize {
        self.nodes.iter().map(TreeNode::file_count).sum()
    }

    pub fn directory_count(&self) -> usize {
        self.nodes.iter().map(TreeNode::directory_count).sum()
    }
}

/// Builds listing trees for one extension filter.
///
/// Node paths are written relative to `base` (the static root), so a client
/// can fetch any listed file by requesting its `path` from the same server.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    filter: ExtensionFilter,
    base: PathBuf,
    log_skipped: bool,
    /// Directory whose enumeration is forced to fail
    #[cfg(test)]
    fail_on: Option<PathBuf>,
}

impl TreeBuilder {
    pub fn new(filter: ExtensionFilter, base: impl Into<PathBuf>) -> Self {
        Self {
            filter,
            base: base.into(),
            log_skipped: false,
            #[cfg(test)]
            fail_on: None,
        }
    }

    /// Report omitted entries at debug level
    #[must_use]
    pub const fn with_skipped_logging(mut self, enabled: bool) -> Self {
        self.log_skipped = enabled;
        self
    }

    /// Build the tree under `root`, logging any traversal failure as a warning.
    ///
    /// Never fails: a missing or unreadable root yields an empty list.
    pub fn build(&self, root: &Path) -> Vec<TreeNode> {
        let listing = self.build_with_report(root);
        for err in &listing.errors {
            logger::log_warning(&err.to_string());
        }
        logger::log_listing_built(
            &slash_path(root),
            listing.file_count(),
            listing.directory_count(),
        );
        listing.nodes
    }

    /// Build the tree under `root` and hand failures back to the caller
    pub fn build_with_report(&self, root: &Path) -> Listing {
        let mut errors = Vec::new();
        let prefix = self.reference_path(root);
        let nodes = self.walk(root, &prefix, &mut errors);
        Listing { nodes, errors }
    }

    fn walk(&self, dir: &Path, rel: &str, errors: &mut Vec<TraversalError>) -> Vec<TreeNode> {
        // The level's handle is closed before descending into any child
        let entries = match self.read_level(dir) {
            Ok(entries) => entries,
            Err(source) => {
                errors.push(TraversalError {
                    path: dir.to_path_buf(),
                    source,
                });
                return Vec::new();
            }
        };

        let mut nodes = Vec::with_capacity(entries.len());
        for entry in entries {
            // A JSON string cannot carry the raw bytes, and a lossy name would
            // point at no real file
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    errors.push(TraversalError {
                        path: entry.path(),
                        source: io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("file name {raw:?} is not valid UTF-8"),
                        ),
                    });
                    continue;
                }
            };
            let path = join_relative(rel, &name);

            // file_type() does not follow symlinks, so links are neither dirs nor files here
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(source) => {
                    errors.push(TraversalError {
                        path: entry.path(),
                        source,
                    });
                    continue;
                }
            };

            if file_type.is_dir() {
                let children = self.walk(&entry.path(), &path, errors);
                nodes.push(TreeNode::Directory {
                    name,
                    path,
                    children,
                });
            } else if file_type.is_file() && self.filter.matches(Path::new(&name)) {
                nodes.push(TreeNode::File { name, path });
            } else if self.log_skipped {
                logger::log_debug(&format!("[Listing] Skipped entry: {path}"));
            }
        }
        nodes
    }

    #[cfg_attr(not(test), allow(clippy::unused_self))]
    fn read_level(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        #[cfg(test)]
        if self.fail_on.as_deref() == Some(dir) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        fs::read_dir(dir)?.collect()
    }

    /// Path of `root` as seen from `base`, slash-separated
    fn reference_path(&self, root: &Path) -> String {
        match (std::path::absolute(root), std::path::absolute(&self.base)) {
            (Ok(root_abs), Ok(base_abs)) => root_abs
                .strip_prefix(&base_abs)
                .map_or_else(|_| slash_path(root), slash_path),
            _ => slash_path(root),
        }
    }
}


fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Render a path with `/` separators, dropping `.` components
fn slash_path(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::RootDir => out.push('/'),
            Component::Prefix(p) => out.push_str(&p.as_os_str().to_string_lossy()),
            Component::ParentDir => {
                out.push_str("..");
                out.push('/');
            }
            Component::Normal(part) => {
                out.push_str(&part.to_string_lossy());
                out.push('/');
            }
        }
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn stl_builder(base: &Path) -> TreeBuilder {
        TreeBuilder::new(ExtensionFilter::new(".stl"), base)
    }

    fn touch(path: &Path) {
        fs::write(path, b"solid test\nendsolid test\n").unwrap();
    }

    fn names(nodes: &[TreeNode]) -> HashSet<&str> {
        nodes.iter().map(TreeNode::name).collect()
    }

    fn find<'a>(nodes: &'a [TreeNode], name: &str) -> &'a TreeNode {
        nodes
            .iter()
            .find(|n| n.name() == name)
            .unwrap_or_else(|| panic!("node {name} not found"))
    }

    fn assert_resolves(base: &Path, nodes: &[TreeNode]) {
        for node in nodes {
            let resolved = base.join(node.path());
            assert!(resolved.exists(), "{} does not exist", resolved.display());
            assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), node.name());
            assert_eq!(resolved.is_dir(), node.is_directory());
            assert_resolves(base, node.children());
        }
    }

    #[test]
    fn test_mixed_root_filters_and_recurses() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("heromedir");
        fs::create_dir_all(root.join("sub")).unwrap();
        touch(&root.join("a.stl"));
        touch(&root.join("b.txt"));
        touch(&root.join("sub/c.STL"));

        let nodes = stl_builder(tmp.path()).build(&root);

        assert_eq!(names(&nodes), HashSet::from(["a.stl", "sub"]));
        assert_eq!(
            find(&nodes, "a.stl"),
            &TreeNode::File {
                name: "a.stl".to_string(),
                path: "heromedir/a.stl".to_string(),
            }
        );
        assert_eq!(
            find(&nodes, "sub"),
            &TreeNode::Directory {
                name: "sub".to_string(),
                path: "heromedir/sub".to_string(),
                children: vec![TreeNode::File {
                    name: "c.STL".to_string(),
                    path: "heromedir/sub/c.STL".to_string(),
                }],
            }
        );
    }

    #[test]
    fn test_empty_root_yields_empty_list() {
        let tmp = TempDir::new().unwrap();
        let listing = stl_builder(tmp.path()).build_with_report(tmp.path());
        assert!(listing.nodes.is_empty());
        assert!(listing.errors.is_empty());
    }

    #[test]
    fn test_nested_empty_directory_kept() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("heromedir");
        fs::create_dir_all(root.join("empty")).unwrap();

        let nodes = stl_builder(tmp.path()).build(&root);
        assert_eq!(
            nodes,
            vec![TreeNode::Directory {
                name: "empty".to_string(),
                path: "heromedir/empty".to_string(),
                children: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_directory_without_matches_still_listed() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("docs/deeper")).unwrap();
        touch(&tmp.path().join("docs/readme.md"));
        touch(&tmp.path().join("docs/deeper/notes.txt"));

        let nodes = stl_builder(tmp.path()).build(tmp.path());
        let docs = find(&nodes, "docs");
        assert!(docs.is_directory());
        assert_eq!(names(docs.children()), HashSet::from(["deeper"]));
        assert!(find(docs.children(), "deeper").children().is_empty());
    }

    #[test]
    fn test_directory_named_like_filter_is_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("x.stl")).unwrap();
        touch(&tmp.path().join("x.stl/inner.stl"));

        let nodes = stl_builder(tmp.path()).build(tmp.path());
        let node = find(&nodes, "x.stl");
        assert!(node.is_directory());
        assert_eq!(names(node.children()), HashSet::from(["inner.stl"]));
    }

    #[test]
    fn test_missing_root_reports_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("heromedir");

        let listing = stl_builder(tmp.path()).build_with_report(&missing);
        assert!(listing.nodes.is_empty());
        assert_eq!(listing.errors.len(), 1);
        assert_eq!(listing.errors[0].path, missing);
        assert_eq!(listing.errors[0].source.kind(), io::ErrorKind::NotFound);
        assert!(stl_builder(tmp.path()).build(&missing).is_empty());
    }

    #[test]
    fn test_root_that_is_a_file_reports_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("model.stl");
        touch(&file);

        let listing = stl_builder(tmp.path()).build_with_report(&file);
        assert!(listing.nodes.is_empty());
        assert_eq!(listing.errors.len(), 1);
    }

    #[test]
    fn test_paths_resolve_against_base() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("heromedir");
        fs::create_dir_all(root.join("a/b")).unwrap();
        touch(&root.join("a/b/deep.stl"));
        touch(&root.join("top.stl"));

        let nodes = stl_builder(tmp.path()).build(&root);
        assert_resolves(tmp.path(), &nodes);
        assert_eq!(nodes.iter().map(TreeNode::file_count).sum::<usize>(), 2);
    }

    #[test]
    fn test_root_outside_base_keeps_given_path() {
        let base = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        touch(&other.path().join("part.stl"));

        let nodes = stl_builder(base.path()).build(other.path());
        let expected = format!("{}/part.stl", slash_path(other.path()));
        assert_eq!(nodes[0].path(), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_omitted() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("real.stl"));
        fs::create_dir(tmp.path().join("dir")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real.stl"), tmp.path().join("link.stl"))
            .unwrap();
        std::os::unix::fs::symlink(tmp.path().join("dir"), tmp.path().join("dirlink")).unwrap();

        let nodes = stl_builder(tmp.path()).build(tmp.path());
        assert_eq!(names(&nodes), HashSet::from(["real.stl", "dir"]));
    }

    #[test]
    fn test_unreadable_directory_is_contained() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("heromedir");
        fs::create_dir_all(root.join("locked")).unwrap();
        fs::create_dir_all(root.join("open")).unwrap();
        touch(&root.join("locked/hidden.stl"));
        touch(&root.join("open/visible.stl"));
        touch(&root.join("top.stl"));

        let mut builder = stl_builder(tmp.path());
        builder.fail_on = Some(root.join("locked"));
        let listing = builder.build_with_report(&root);

        assert_eq!(names(&listing.nodes), HashSet::from(["locked", "open", "top.stl"]));
        let locked = find(&listing.nodes, "locked");
        assert!(locked.is_directory());
        assert!(locked.children().is_empty());
        assert_eq!(
            names(find(&listing.nodes, "open").children()),
            HashSet::from(["visible.stl"])
        );
        assert_eq!(listing.errors.len(), 1);
        assert_eq!(listing.errors[0].path, root.join("locked"));
        assert_eq!(listing.errors[0].source.kind(), io::ErrorKind::PermissionDenied);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_reported_not_listed() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join(OsStr::from_bytes(b"bad\xff.stl"));
        touch(&bad);
        touch(&tmp.path().join("good.stl"));

        let listing = stl_builder(tmp.path()).build_with_report(tmp.path());
        assert_eq!(names(&listing.nodes), HashSet::from(["good.stl"]));
        assert_eq!(listing.errors.len(), 1);
        assert_eq!(listing.errors[0].path, bad);
        assert_eq!(listing.errors[0].source.kind(), io::ErrorKind::InvalidData);
        assert_resolves(tmp.path(), &listing.nodes);
    }

    #[test]
    fn test_listing_counts() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        touch(&tmp.path().join("one.stl"));
        touch(&tmp.path().join("a/two.stl"));
        touch(&tmp.path().join("a/b/three.STL"));
        touch(&tmp.path().join("a/b/skip.obj"));

        let listing = stl_builder(tmp.path()).build_with_report(tmp.path());
        assert_eq!(listing.file_count(), 3);
        assert_eq!(listing.directory_count(), 2);
    }

    #[test]
    fn test_slash_path() {
        assert_eq!(slash_path(Path::new("./heromedir/sub")), "heromedir/sub");
        assert_eq!(slash_path(Path::new("heromedir/")), "heromedir");
        assert_eq!(slash_path(Path::new(".")), "");
        assert_eq!(slash_path(Path::new("/")), "/");
        assert_eq!(join_relative("", "a.stl"), "a.stl");
        assert_eq!(join_relative("heromedir", "a.stl"), "heromedir/a.stl");
        assert_eq!(join_relative("/", "srv"), "/srv");
    }
}
