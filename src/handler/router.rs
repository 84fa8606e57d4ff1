//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method checks,
//! error mapping and access logging.

use crate::config::AppState;
use crate::gallery;
use crate::handler::{modify, static_files, upload};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub query: Option<String>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Routes the server knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    UploadForm,
    Upload,
    Modify(&'a str),
    Image(&'a str),
    Health,
    NotFound,
}

impl<'a> Route<'a> {
    fn match_path(path: &'a str) -> Self {
        match path {
            "/" => Self::UploadForm,
            "/upload" => Self::Upload,
            "/healthz" => Self::Health,
            _ => {
                if let Some(name) = path.strip_prefix("/modify/") {
                    Self::Modify(name)
                } else if let Some(name) = path.strip_prefix("/img/") {
                    Self::Image(name)
                } else {
                    Self::NotFound
                }
            }
        }
    }

    /// Methods accepted on this route, for method checks and `Allow`
    const fn allowed(self) -> &'static str {
        match self {
            Self::Upload => "POST",
            Self::Modify(_) => "GET",
            _ => "GET, HEAD",
        }
    }

    fn accepts(self, method: &Method) -> bool {
        match self {
            Self::Upload => method == Method::POST,
            // Each request runs the tool, so HEAD is not offered
            Self::Modify(_) => method == Method::GET,
            _ => method == Method::GET || method == Method::HEAD,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<HttpResponse, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let entry = state.config.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = format!("{:?}", req.version())
            .trim_start_matches("HTTP/")
            .to_string();
        entry.referer = header_string(&req, "referer");
        entry.user_agent = header_string(&req, "user-agent");
        entry
    });

    let mut response = route_request(req, &state).await;
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Route request based on path and method
async fn route_request<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = req.uri().path().to_string();
    let route = Route::match_path(&path);

    if route == Route::NotFound {
        return http::build_404_response();
    }
    if !route.accepts(req.method()) {
        logger::log_warning(&format!("Method not allowed: {} {path}", req.method()));
        return http::build_405_response(route.allowed());
    }

    if route == Route::Upload {
        return upload::handle_upload(req, state)
            .await
            .unwrap_or_else(|err| http::build_error_response(&err));
    }

    let ctx = RequestContext {
        path: &path,
        query: req.uri().query().map(ToString::to_string),
        is_head: req.method() == Method::HEAD,
        if_none_match: header_string(&req, "if-none-match"),
    };

    let result = match route {
        Route::UploadForm => Ok(http::build_html_response(gallery::upload_form(), ctx.is_head)),
        Route::Health => Ok(http::build_text_response(StatusCode::OK, "ok")),
        Route::Image(name) => Ok(static_files::serve_image(&ctx, &state.store, name).await),
        Route::Modify(name) => modify::handle_modify(name, ctx.query.as_deref(), state).await,
        Route::Upload | Route::NotFound => Ok(http::build_404_response()),
    };

    result.unwrap_or_else(|err| http::build_error_response(&err))
}
