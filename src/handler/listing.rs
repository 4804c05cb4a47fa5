//! Listing endpoint
//!
//! Builds the tree under the listing root on every request and returns it
//! as a JSON array. Traversal problems never change the status code.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, response::HttpResponse};
use crate::logger;
use std::sync::Arc;

pub async fn serve_listing(ctx: &RequestContext, state: &Arc<AppState>) -> HttpResponse {
    let builder = state.tree_builder.clone();
    let root = state.listing_root.clone();

    // Filesystem walk is blocking; keep it off the async workers
    let nodes = match tokio::task::spawn_blocking(move || builder.build(&root)).await {
        Ok(nodes) => nodes,
        Err(e) => {
            logger::log_error(&format!("Listing task failed: {e}"));
            return http::build_500_response();
        }
    };

    http::response::build_json_response(&nodes, ctx.is_head)
}
