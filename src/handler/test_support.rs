//! Shared helpers for handler tests

use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Request;
use std::sync::Mutex;

use crate::primitive::{TransformError, TransformOptions, Transformer};

/// In-memory stand-in for the external tool
#[derive(Default)]
pub struct MockTransformer {
    pub calls: Mutex<Vec<TransformOptions>>,
    pub fail: bool,
}

impl MockTransformer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transformer for MockTransformer {
    async fn transform(
        &self,
        input: &[u8],
        ext: &str,
        options: TransformOptions,
    ) -> Result<Vec<u8>, TransformError> {
        self.calls.lock().unwrap().push(options);
        if self.fail {
            return Err(TransformError::EmptyOutput("mock".to_string()));
        }
        let mode = options.mode.map_or(-1, |m| i32::from(m.code()));
        let mut out = format!("{ext}:{}:{mode}:", options.shapes).into_bytes();
        out.extend_from_slice(input);
        Ok(out)
    }
}

/// Build a `multipart/form-data` request with a single file field
pub fn multipart_request(field: &str, filename: &str, data: &[u8]) -> Request<Full<Bytes>> {
    let boundary = "----primitive-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("Content-Length", body.len())
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
