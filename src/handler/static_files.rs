//! Static image serving module
//!
//! `GET|HEAD /img/{name}` serves files from the image directory with `ETag`
//! revalidation.

use hyper::body::Bytes;

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, HttpResponse};
use crate::logger;
use crate::store::{ImageStore, StoreError};

/// Serve one stored image
pub async fn serve_image(ctx: &RequestContext<'_>, store: &ImageStore, name: &str) -> HttpResponse {
    let path = match store.resolve(name).await {
        Ok(path) => path,
        Err(StoreError::InvalidName(_)) => {
            logger::log_warning(&format!("Rejected image path: {}", ctx.path));
            return http::build_404_response();
        }
        Err(StoreError::NotFound(_)) => return http::build_404_response(),
        Err(e) => {
            logger::log_error(&format!("Failed to stat image '{name}': {e}"));
            return http::build_404_response();
        }
    };

    let content = match tokio::fs::read(&path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let etag = cache::generate_etag(&content);
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    http::build_cached_response(Bytes::from(content), content_type, &etag, ctx.is_head)
}
