//! HTTP cache validation module
//!
//! `ETag`s for static files are derived from size and modification time, so
//! a conditional request can be answered without reading the file.

use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Weak `ETag` from file metadata, e.g. `W/"1f4-18c2d3a9b10"`
pub fn etag_for_metadata(metadata: &Metadata) -> String {
    let modified_ms = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis());
    format_etag(metadata.len(), modified_ms)
}

fn format_etag(len: u64, modified_ms: u128) -> String {
    format!("W/\"{len:x}-{modified_ms:x}\"")
}

/// Check the client's `If-None-Match` header against the server's `ETag`.
///
/// Accepts a single tag, a comma-separated list, or `*`. Comparison is weak:
/// the `W/` prefix is ignored on both sides.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = etag.trim_start_matches("W/");
    if_none_match.is_some_and(|header| {
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.trim_start_matches("W/") == ours
        })
    })
}
