//! Static file serving module
//!
//! Serves everything under the static root: regular files with MIME type and
//! validators, index files for directories, and a generated HTML index when
//! a directory has none.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, response::HttpResponse};
use crate::logger;
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use std::fmt::Write as _;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Serve a request path from the static root
pub async fn serve_static(ctx: &RequestContext, state: &AppState) -> HttpResponse {
    let Some(relative) = sanitize_path(&ctx.path) else {
        logger::log_warning(&format!("Rejected request path: {}", ctx.path));
        return http::build_404_response();
    };

    let root = state.static_root();
    let target = root.join(&relative);
    let Ok(metadata) = fs::metadata(&target).await else {
        return http::build_404_response();
    };

    if !is_within_root(root, &target).await {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            ctx.path,
            target.display()
        ));
        return http::build_404_response();
    }

    if metadata.is_dir() {
        return serve_directory(ctx, state, &relative, &target).await;
    }
    serve_file(ctx, &target, &metadata).await
}

async fn serve_directory(
    ctx: &RequestContext,
    state: &AppState,
    relative: &Path,
    dir: &Path,
) -> HttpResponse {
    if !ctx.path.ends_with('/') {
        let location = directory_location(relative, ctx.query.as_deref());
        return http::build_301_response(&location);
    }

    for index in &state.config.static_files.index_files {
        let index_path = dir.join(index);
        if let Ok(metadata) = fs::metadata(&index_path).await {
            if metadata.is_file() {
                return serve_file(ctx, &index_path, &metadata).await;
            }
        }
    }

    if !state.config.static_files.autoindex {
        return http::build_404_response();
    }

    match render_index(dir, &ctx.path).await {
        Ok(html) => http::response::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "No permission to list directory {}: {e}",
                dir.display()
            ));
            http::build_404_response()
        }
    }
}

async fn serve_file(ctx: &RequestContext, path: &Path, metadata: &Metadata) -> HttpResponse {
    let etag = cache::etag_for_metadata(metadata);
    let modified = metadata.modified().ok();

    // If-None-Match takes precedence over If-Modified-Since
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match.as_deref(), &etag)
    } else {
        modified.is_some_and(|m| not_modified_since(ctx.if_modified_since.as_deref(), m))
    };
    if not_modified {
        return http::build_304_response(&etag);
    }

    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    let last_modified = modified.map(http_date);
    http::response::build_file_response(
        Bytes::from(content),
        content_type,
        &etag,
        last_modified.as_deref(),
        ctx.is_head,
    )
}

/// Decode a request path into a relative filesystem path.
///
/// Returns `None` for undecodable input, `..` segments, or embedded
/// separators and NUL bytes.
fn sanitize_path(raw: &str) -> Option<PathBuf> {
    let decoded = percent_decode(raw)?;
    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => relative.push(s),
        }
    }
    Some(relative)
}

/// Redirect target for a directory requested without its trailing slash.
///
/// Rebuilt from the sanitized segments so the result always starts with a
/// single `/` and stays on this host.
fn directory_location(relative: &Path, query: Option<&str>) -> String {
    let mut location = String::from("/");
    for part in relative {
        location.push_str(&percent_encode(&part.to_string_lossy()));
        location.push('/');
    }
    if let Some(q) = query {
        location.push('?');
        location.push_str(q);
    }
    location
}

/// Canonical target must stay inside the canonical root (symlinks included)
async fn is_within_root(root: &Path, target: &Path) -> bool {
    match (fs::canonicalize(root).await, fs::canonicalize(target).await) {
        (Ok(root), Ok(target)) => target.starts_with(root),
        _ => false,
    }
}

fn not_modified_since(header: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = header.and_then(|h| DateTime::parse_from_rfc2822(h).ok()) else {
        return false;
    };
    let modified: DateTime<Utc> = modified.into();
    modified.timestamp() <= since.timestamp()
}

fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE).to_string()
}

/// HTML index of a directory, entries sorted case-insensitively
async fn render_index(dir: &Path, url_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
        entries.push((name, is_dir));
    }
    entries.sort_by_key(|(name, _)| name.to_lowercase());

    let shown = percent_decode(url_path).unwrap_or_else(|| url_path.to_string());
    let title = format!("Directory listing for {}", html_escape(&shown));
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for (name, is_dir) in &entries {
        let suffix = if *is_dir { "/" } else { "" };
        let _ = writeln!(
            html,
            "<li><a href=\"{}{suffix}\">{}{suffix}</a></li>",
            percent_encode(name),
            html_escape(name)
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn percent_encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
