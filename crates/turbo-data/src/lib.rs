//! HTTP client utilities for TurboCommerce.
//!
//! Provides a small builder API over `reqwest` with automatic JSON handling
//! and fully buffered responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use turbo_data::FetchClient;
//!
//! let client = FetchClient::new().with_base_url("http://localhost:3000");
//!
//! // PATCH with JSON body
//! client
//!     .patch("/users/42")
//!     .json(&serde_json::json!({ "cart": [] }))?
//!     .send()
//!     .await?
//!     .error_for_status()?;
//! ```

mod error;
mod request;
mod response;

use std::collections::HashMap;
use std::time::Duration;

pub use error::FetchError;
pub use request::{Method, RequestBuilder};
pub use response::Response;

/// HTTP client for making outbound requests.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self::from_reqwest(reqwest::Client::new())
    }

    /// Wrap an existing reqwest client.
    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: None,
            default_headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Create a client with a base URL that will be prepended to relative requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Apply a per-request timeout. Requests have none by default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Create a GET request.
    pub fn get(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Get, url)
    }

    /// Create a POST request.
    pub fn post(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Post, url)
    }

    /// Create a PATCH request.
    pub fn patch(&self, url: impl Into<String>) -> ClientRequestBuilder {
        self.request(Method::Patch, url)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> ClientRequestBuilder {
        let mut builder = RequestBuilder::new(method, self.resolve(url.into()));
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }

        ClientRequestBuilder {
            http: self.http.clone(),
            timeout: self.timeout,
            builder,
        }
    }

    fn resolve(&self, url: String) -> String {
        match &self.base_url {
            Some(base) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    url.trim_start_matches('/')
                )
            }
            _ => url,
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder {
    http: reqwest::Client,
    timeout: Option<Duration>,
    builder: RequestBuilder,
}

impl ClientRequestBuilder {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// Add a bearer token authorization header.
    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// The request as built so far.
    pub fn request(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Send the request and buffer the response.
    ///
    /// Non-2xx responses are returned as `Ok`; use
    /// [`Response::error_for_status`] to turn them into errors.
    pub async fn send(self) -> Result<Response, FetchError> {
        let method = self.builder.method();
        let url = self.builder.url().to_string();

        let mut request = self.builder.into_reqwest(&self.http);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, %url, error = %e, "request failed");
            FetchError::from(e)
        })?;
        let response = Response::read(response).await?;
        tracing::trace!(%method, %url, status = response.status, "request completed");
        Ok(response)
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FetchClient, FetchError, Method, Response};
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_resolution() {
        let client = FetchClient::new().with_base_url("http://api.local/");
        assert_eq!(
            client.get("/users/1").request().url(),
            "http://api.local/users/1"
        );
        assert_eq!(
            client.get("users/1").request().url(),
            "http://api.local/users/1"
        );
        assert_eq!(
            client.get("https://other.host/x").request().url(),
            "https://other.host/x"
        );
    }

    #[test]
    fn test_default_headers_applied() {
        let client = FetchClient::new().with_default_header("X-Store", "ng");
        let req = client.get("http://x/");
        assert_eq!(
            req.request().headers.get("X-Store").map(String::as_str),
            Some("ng")
        );
    }

    #[tokio::test]
    async fn test_patch_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/7"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"wishlist": []})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "7"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = FetchClient::new().with_base_url(server.uri());
        let resp = client
            .patch("/users/7")
            .json(&serde_json::json!({"wishlist": []}))
            .unwrap()
            .send()
            .await
            .unwrap();

        assert!(resp.is_success());
        let body: serde_json::Value = resp.json().unwrap();
        assert_eq!(body["id"], "7");
    }

    #[tokio::test]
    async fn test_non_success_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let resp = FetchClient::new()
            .get(format!("{}/latest/USD", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status, 503);
        assert!(resp.error_for_status().unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = FetchClient::new()
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await;
        assert!(matches!(result, Err(FetchError::RequestError(_))));
    }
}
