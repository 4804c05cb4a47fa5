//! Static file server with a JSON listing of STL models
//!
//! Serves the working directory over HTTP and exposes `/list-files`, a
//! recursive tree of the model directory filtered by file extension.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod tree;
