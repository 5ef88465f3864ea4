//! Network seam. [`ResilientApiClient`](crate::ResilientApiClient) owns
//! timeout and retry; a transport performs exactly one attempt.

use async_trait::async_trait;

use crate::error::TransportFailure;
use crate::request::{HttpMethod, HttpRequest, RawResponse, RequestBody};

/// One HTTP attempt.
///
/// Implementations must be `Send + Sync`; the client may be shared across
/// tasks. Dropping the returned future must abort the in-flight request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, req: &HttpRequest) -> Result<RawResponse, TransportFailure>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else if e.is_builder() {
        TransportFailure::InvalidRequest(e.to_string())
    } else {
        TransportFailure::Network(e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, req: &HttpRequest) -> Result<RawResponse, TransportFailure> {
        let method = match req.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, self.url_for(&req.path));
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match &req.body {
            None => {}
            Some(RequestBody::Json(v)) => builder = builder.json(v),
            Some(RequestBody::Multipart {
                field,
                file_name,
                content_type,
                bytes,
            }) => {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(content_type)
                    .map_err(|e| TransportFailure::InvalidRequest(e.to_string()))?;
                builder = builder.multipart(reqwest::multipart::Form::new().part(field.clone(), part));
            }
        }

        let resp = builder.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
