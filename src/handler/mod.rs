//! Request handler module
//!
//! Routing plus the upload, drill-down and static image handlers.

pub mod modify;
pub mod router;
pub mod static_files;
pub mod upload;

#[cfg(test)]
mod test_support;

// Re-export main entry point
pub use router::handle_request;
