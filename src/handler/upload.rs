//! Upload handler
//!
//! `POST /upload` with a multipart body; the `image` field is stored in the
//! image directory and the client is redirected to `/modify/{name}`.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::Request;

use crate::config::AppState;
use crate::error::AppError;
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::store;

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Reject early when the declared Content-Length exceeds the bound
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Result<(), AppError> {
    let Some(content_length) = headers.get(CONTENT_LENGTH) else {
        return Ok(());
    };
    match content_length.to_str().ok().map(str::parse::<u64>) {
        Some(Ok(size)) if size > max_body_size => Err(AppError::TooLarge(max_body_size)),
        Some(Ok(_)) => Ok(()),
        _ => {
            logger::log_warning("Invalid Content-Length value, skipping size check");
            Ok(())
        }
    }
}

fn multipart_boundary(headers: &HeaderMap) -> Result<String, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::NotMultipart("missing Content-Type".to_string()))?;
    multer::parse_boundary(content_type).map_err(|e| AppError::NotMultipart(e.to_string()))
}

/// Body limit violations surface from multer as stream read failures
fn form_error(err: multer::Error, max_body_size: u64) -> AppError {
    if let multer::Error::StreamReadFailed(inner) = &err {
        if inner.is::<LengthLimitError>() {
            return AppError::TooLarge(max_body_size);
        }
    }
    AppError::MalformedForm(err.to_string())
}

pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> Result<HttpResponse, AppError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    check_body_size(req.headers(), max_body_size)?;
    let boundary = multipart_boundary(req.headers())?;

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = Limited::new(req.into_body(), limit).into_data_stream();
    let mut multipart = multer::Multipart::new(body, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, max_body_size))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let ext = store::extension_of(&filename)
            .ok_or_else(|| AppError::MissingExtension(filename.clone()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| form_error(e, max_body_size))?;

        let name = state.store.save(data.to_vec(), &ext).await?;
        logger::log_info(&format!(
            "Stored upload '{filename}' ({} bytes) as {name}",
            data.len()
        ));
        return Ok(http::build_redirect_response(&format!("/modify/{name}")));
    }

    Err(AppError::MissingField(IMAGE_FIELD))
}
