//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, body size
//! check, then either the listing endpoint or the static file handler.

use crate::config::AppState;
use crate::handler::{listing, static_files};
use crate::http::{self, response::HttpResponse};
use crate::logger::{self, AccessLogEntry};
use hyper::body::Body;
use hyper::header::HeaderMap;
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Owned request data the handlers need; the request itself is dropped
/// before any await point.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw (still percent-encoded) request path
    pub path: String,
    pub query: Option<String>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            is_head: req.method() == Method::HEAD,
            if_none_match: header_string(req.headers(), "if-none-match"),
            if_modified_since: header_string(req.headers(), "if-modified-since"),
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let mut entry = state.access_log_enabled().then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = version_label(req.version()).to_string();
        entry.referer = header_string(req.headers(), "referer");
        entry.user_agent = header_string(req.headers(), "user-agent");
        entry
    });

    let early = precheck(&req, &state);
    let response = match early {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext::from_request(&req);
            drop(req);
            route_request(&ctx, &state).await
        }
    };
    let response = http::response::with_server_header(response, &state.config.http.server_name);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Method and body-size checks that end the request early
fn precheck<B>(req: &Request<B>, state: &AppState) -> Option<HttpResponse> {
    check_http_method(req.method(), state.config.http.enable_cors)
        .or_else(|| check_body_size(req.headers(), state.config.http.max_body_size))
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<HttpResponse> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<HttpResponse> {
    let size_str = headers.get("content-length")?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}

/// Listing endpoint on exact path match, static files for everything else
async fn route_request(ctx: &RequestContext, state: &Arc<AppState>) -> HttpResponse {
    if ctx.path == state.config.listing.endpoint {
        return listing::serve_listing(ctx, state).await;
    }
    static_files::serve_static(ctx, state).await
}

fn version_label(version: hyper::Version) -> &'static str {
    if version == hyper::Version::HTTP_10 {
        "1.0"
    } else if version == hyper::Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}
