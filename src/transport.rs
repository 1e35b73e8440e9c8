//! HTTP transport for the polling loop.
//!
//! The loop only needs one GET with two headers, and only looks at the
//! status code, the `Content-Type` header and the body. [`HttpClient`] is that
//! much of a client; [`ReqwestClient`] (feature `reqwest`) implements it.
//!
//! No request timeout is applied. The only bounded waits are in Wi-Fi
//! bring-up.

use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::StatusCode;

use crate::config::Settings;
use crate::error::Error;

/// The request issued once per polling cycle.
#[derive(Debug, Clone)]
pub struct PollRequest {
    url: String,
    headers: HeaderMap,
}

impl PollRequest {
    /// Create a request without headers.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Build the request from settings: `User-Agent` and `Authorization`.
    ///
    /// Header values that are not valid HTTP are a configuration error.
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        Self::new(&settings.request_url)
            .with_header(USER_AGENT, &settings.request_header_user_agent)?
            .with_header(AUTHORIZATION, &settings.request_header_authorization)
    }

    /// Add a header.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Result<Self, Error> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// What the polling loop sees of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create an empty response with `status`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Set the `Content-Type` header.
    #[must_use]
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// `Content-Type` header, if present and valid text.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }
}

/// Minimal asynchronous HTTP client.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// Issue a GET and read the whole body.
    ///
    /// Any status code is a successful exchange; only transport failures
    /// are errors.
    async fn get(&mut self, request: &PollRequest) -> Result<HttpResponse, Error>;
}

/// [`HttpClient`] backed by `reqwest`.
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    http: reqwest::Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestClient {
    /// Create a client with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom `reqwest` client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }
}

#[cfg(feature = "reqwest")]
impl HttpClient for ReqwestClient {
    async fn get(&mut self, request: &PollRequest) -> Result<HttpResponse, Error> {
        tracing::debug!(url = request.url(), "polling server");

        let response = self
            .http
            .get(request.url())
            .headers(request.headers().clone())
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        tracing::debug!(%status, bytes = body.len(), "server responded");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_settings() {
        let settings = Settings::new("http://example.test/poll")
            .with_user_agent("pollpanel/0.1")
            .with_authorization("Bearer abc");
        let request = PollRequest::from_settings(&settings).unwrap();

        assert_eq!(request.url(), "http://example.test/poll");
        assert_eq!(request.headers()[USER_AGENT], "pollpanel/0.1");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer abc");
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let settings = Settings::new("http://example.test/poll").with_authorization("bad\nvalue");
        let err = PollRequest::from_settings(&settings).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_response_content_type() {
        let response = HttpResponse::new(StatusCode::OK);
        assert_eq!(response.content_type(), None);

        let response = response.with_content_type("image/png").with_body(vec![1, 2, 3]);
        assert_eq!(response.content_type(), Some("image/png"));
        assert_eq!(response.body, vec![1, 2, 3]);
    }
}
