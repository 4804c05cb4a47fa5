// Configuration module entry point
// Loads the server configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, HttpConfig, ListingConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StaticFilesConfig,
};

/// Default config file name (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `STLTREE_SERVER__PORT=9000`
const ENV_PREFIX: &str = "STLTREE";

impl Config {
    /// Load configuration from specified file path (extension optional).
    /// A missing file is fine; defaults reproduce the stock setup.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    fn defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("listing.root", "heromedir")?
            .set_default("listing.extension", ".stl")?
            .set_default("listing.endpoint", "/list-files")?
            .set_default("listing.log_skipped", false)?
            .set_default("static_files.root", ".")?
            .set_default("static_files.index_files", vec!["index.html", "index.htm"])?
            .set_default("static_files.autoindex", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "stl-tree-server")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576) // 1MB
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
