// Application state module
// Immutable per-process state shared by every connection

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::tree::{ExtensionFilter, TreeBuilder};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Directory static files are served from
    pub static_root: PathBuf,
    /// Directory walked by the listing endpoint
    pub listing_root: PathBuf,
    /// Tree builder bound to the configured extension filter
    pub tree_builder: TreeBuilder,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let static_root = PathBuf::from(&config.static_files.root);
        let listing_root = PathBuf::from(&config.listing.root);
        let tree_builder = TreeBuilder::new(
            ExtensionFilter::new(&config.listing.extension),
            static_root.clone(),
        )
        .with_skipped_logging(config.listing.log_skipped);

        Self {
            config: config.clone(),
            static_root,
            listing_root,
            tree_builder,
        }
    }

    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    pub fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
