use std::sync::Arc;

use stl_tree_server::config::{self, AppState, Config};
use stl_tree_server::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let local_addr = listener.local_addr()?;

    let state = Arc::new(AppState::new(&cfg));
    if !state.listing_root.is_dir() {
        logger::log_warning(&format!(
            "Listing root '{}' is not a directory, {} will return an empty tree",
            cfg.listing.root, cfg.listing.endpoint
        ));
    }

    logger::log_server_start(&local_addr, &cfg);

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    server::run(listener, state, signals).await?;
    Ok(())
}
