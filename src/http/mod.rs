//! HTTP protocol layer module
//!
//! Response builders, MIME lookup and `ETag` handling shared by the
//! listing endpoint and the static file handler.

pub mod cache;
pub mod mime;
pub mod response;

pub use response::{
    build_301_response, build_304_response, build_404_response, build_405_response,
    build_413_response, build_500_response, build_options_response,
};
