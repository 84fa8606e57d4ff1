//! Drill-down handler
//!
//! `GET /modify/{name}?mode=&n=` walks the user from a stored upload to a
//! final image: first a choice of shape modes, then a choice of shape
//! counts, then the generated image itself.

use crate::config::AppState;
use crate::error::AppError;
use crate::gallery::{self, Thumbnail};
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::primitive::{Mode, TransformOptions};

/// Validated `mode` and `n` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifyQuery {
    pub mode: Option<Mode>,
    pub shapes: Option<u32>,
}

/// First value of `key` in a query string, form-decoded; empty values count
/// as absent
fn query_value(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| form_decode(v))
        .filter(|v| !v.is_empty())
}

/// `application/x-www-form-urlencoded` value decoding: `+` is a space and
/// `%XX` a byte. Malformed escapes are kept as written.
fn form_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    out.push(byte);
                    i += 2;
                } else {
                    out.push(b'%');
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

impl ModifyQuery {
    pub fn parse(query: Option<&str>) -> Result<Self, AppError> {
        let query = query.unwrap_or_default();

        let mode = query_value(query, "mode")
            .map(|raw| raw.parse::<Mode>())
            .transpose()?;

        let shapes = query_value(query, "n")
            .map(|raw| match raw.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(AppError::InvalidCount(raw)),
            })
            .transpose()?;

        Ok(Self { mode, shapes })
    }
}

pub async fn handle_modify(
    name: &str,
    query: Option<&str>,
    state: &AppState,
) -> Result<HttpResponse, AppError> {
    // Validate before touching the filesystem or the tool
    let params = ModifyQuery::parse(query)?;
    let (source, ext) = state.store.load(name).await?;

    match params {
        ModifyQuery { mode: None, .. } => {
            let shapes = state.config.gallery.default_shapes;
            let choices: Vec<_> = Mode::GALLERY.iter().map(|&m| (m, shapes)).collect();
            let thumbnails = generate(state, &source, &ext, &choices).await?;
            Ok(http::build_html_response(
                gallery::render_mode_choices(name, &thumbnails),
                false,
            ))
        }
        ModifyQuery {
            mode: Some(mode),
            shapes: None,
        } => {
            let choices: Vec<_> = state
                .config
                .gallery
                .shape_counts
                .iter()
                .map(|&n| (mode, n))
                .collect();
            let thumbnails = generate(state, &source, &ext, &choices).await?;
            Ok(http::build_html_response(
                gallery::render_count_choices(name, mode, &thumbnails),
                false,
            ))
        }
        ModifyQuery {
            mode: Some(mode),
            shapes: Some(shapes),
        } => {
            let image = generate_one(state, &source, &ext, mode, shapes).await?;
            Ok(http::build_redirect_response(&format!("/img/{image}")))
        }
    }
}

/// Run the transform once per choice, sequentially, storing every output
async fn generate(
    state: &AppState,
    source: &[u8],
    ext: &str,
    choices: &[(Mode, u32)],
) -> Result<Vec<Thumbnail>, AppError> {
    let mut thumbnails = Vec::with_capacity(choices.len());
    for &(mode, shapes) in choices {
        let image = generate_one(state, source, ext, mode, shapes).await?;
        thumbnails.push(Thumbnail {
            image,
            mode,
            shapes,
        });
    }
    Ok(thumbnails)
}

async fn generate_one(
    state: &AppState,
    source: &[u8],
    ext: &str,
    mode: Mode,
    shapes: u32,
) -> Result<String, AppError> {
    let options = TransformOptions::new(shapes).with_mode(mode);
    let output = state.transformer.transform(source, ext, options).await?;
    let image = state.store.save(output, ext).await?;
    logger::log_info(&format!(
        "Generated {image} ({} x{shapes})",
        mode.name()
    ));
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::test_support::MockTransformer;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::sync::Arc;

    struct Fixture {
        dir: tempfile::TempDir,
        mock: Arc<MockTransformer>,
        state: AppState,
        source: String,
    }

    async fn fixture(mock: MockTransformer) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(mock);
        let state = AppState::with_transformer(&Config::for_tests(dir.path()), mock.clone());
        let source = state.store.save(b"source".to_vec(), "jpg").await.unwrap();
        Fixture {
            dir,
            mock,
            state,
            source,
        }
    }

    async fn body_string(resp: HttpResponse) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_query_parsing() {
        assert_eq!(ModifyQuery::parse(None).unwrap(), ModifyQuery::default());
        assert_eq!(
            ModifyQuery::parse(Some("mode=1&n=100")).unwrap(),
            ModifyQuery {
                mode: Some(Mode::Triangle),
                shapes: Some(100)
            }
        );
        assert_eq!(
            ModifyQuery::parse(Some("mode=&n=")).unwrap(),
            ModifyQuery::default()
        );
        assert_eq!(
            ModifyQuery::parse(Some("other&mode=4&mode=5")).unwrap().mode,
            Some(Mode::Circle)
        );
        assert_eq!(
            ModifyQuery::parse(Some("n=50")).unwrap(),
            ModifyQuery {
                mode: None,
                shapes: Some(50)
            }
        );
        assert_eq!(
            ModifyQuery::parse(Some("mode=%31&n=%35%30")).unwrap(),
            ModifyQuery {
                mode: Some(Mode::Triangle),
                shapes: Some(50)
            }
        );
    }

    #[test]
    fn test_form_decode() {
        assert_eq!(form_decode("abc"), "abc");
        assert_eq!(form_decode("%31%30"), "10");
        assert_eq!(form_decode("a+b"), "a b");
        assert_eq!(form_decode("100%"), "100%");
        assert_eq!(form_decode("%zz1"), "%zz1");
        assert_eq!(form_decode("%+1"), "% 1");
    }

    #[test]
    fn test_query_rejects_bad_values() {
        for query in [
            "mode=abc",
            "mode=42",
            "mode=1&n=many",
            "mode=1&n=0",
            "mode=1&n=-5",
            "mode=1&n=+10",
            "n=0",
        ] {
            let err = ModifyQuery::parse(Some(query)).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{query}");
        }
    }

    #[tokio::test]
    async fn test_mode_gallery() {
        let fx = fixture(MockTransformer::default()).await;

        let resp = handle_modify(&fx.source, None, &fx.state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;

        assert_eq!(html.matches("<a href=").count(), 7);
        for mode in Mode::GALLERY {
            assert!(html.contains(&format!("/modify/{}?mode={}\"", fx.source, mode.code())));
        }
        let calls = fx.mock.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 7);
        assert!(calls.iter().all(|c| c.shapes == 100));
        // source plus one generated image per mode
        assert_eq!(std::fs::read_dir(fx.dir.path()).unwrap().count(), 8);
    }

    #[tokio::test]
    async fn test_count_without_mode_shows_mode_gallery() {
        let fx = fixture(MockTransformer::default()).await;

        let resp = handle_modify(&fx.source, Some("n=50"), &fx.state)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;

        assert_eq!(html.matches("<a href=").count(), 7);
        let calls = fx.mock.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 7);
        assert!(calls.iter().all(|c| c.shapes == 100));
    }

    #[tokio::test]
    async fn test_count_gallery() {
        let fx = fixture(MockTransformer::default()).await;

        let resp = handle_modify(&fx.source, Some("mode=1"), &fx.state)
            .await
            .unwrap();
        let html = body_string(resp).await;

        assert_eq!(html.matches("<a href=").count(), 5);
        for n in [10, 50, 100, 200, 500] {
            assert!(html.contains(&format!("?mode=1&n={n}\"")));
        }
        let calls = fx.mock.calls.lock().unwrap().clone();
        assert!(calls.iter().all(|c| c.mode == Some(Mode::Triangle)));
        assert_eq!(
            calls.iter().map(|c| c.shapes).collect::<Vec<_>>(),
            vec![10, 50, 100, 200, 500]
        );
    }

    #[tokio::test]
    async fn test_final_redirect() {
        let fx = fixture(MockTransformer::default()).await;

        let resp = handle_modify(&fx.source, Some("mode=1&n=100"), &fx.state)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);

        let location = resp.headers()["location"].to_str().unwrap().to_string();
        let image = location.strip_prefix("/img/").unwrap();
        assert!(image.ends_with(".jpg"));
        assert_ne!(image, fx.source);
        let data = std::fs::read(fx.dir.path().join(image)).unwrap();
        assert_eq!(data, b"jpg:100:1:source");
        assert_eq!(fx.mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_query_does_not_invoke_tool() {
        let fx = fixture(MockTransformer::default()).await;

        for query in ["mode=triangle", "mode=1&n=lots"] {
            let err = handle_modify(&fx.source, Some(query), &fx.state)
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(fx.mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_source_is_bad_request() {
        let fx = fixture(MockTransformer::default()).await;

        for name in ["missing.jpg", "..%2Fsecret.jpg", "noext"] {
            let err = handle_modify(name, None, &fx.state).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{name}");
        }
        assert_eq!(fx.mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_tool_failure_is_server_error() {
        let fx = fixture(MockTransformer::failing()).await;

        let err = handle_modify(&fx.source, Some("mode=2"), &fx.state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Aborts on the first failure
        assert_eq!(fx.mock.call_count(), 1);
    }
}
