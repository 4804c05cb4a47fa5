//! Request handler module
//!
//! Routes requests to the JSON listing endpoint or to static file serving.

pub mod listing;
pub mod router;
pub mod static_files;

pub use router::handle_request;
