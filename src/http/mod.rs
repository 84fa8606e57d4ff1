//! HTTP protocol layer module
//!
//! Response builders, content types and cache validation, decoupled from the
//! request handlers.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used items
pub use response::{
    build_304_response, build_404_response, build_405_response, build_cached_response,
    build_error_response, build_html_response, build_redirect_response, build_text_response,
    HttpResponse,
};
