use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;
use thiserror::Error;

/// Outbound request deadline when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A fully-formed outbound call: resolved URL (auth included), headers, body, deadline.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Duration,
    /// Query parameter carrying the API key, if any. Used to redact log output.
    pub secret_param: Option<&'static str>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            secret_param: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The URL with the API key query parameter masked, safe to log.
    pub fn redacted_url(&self) -> String {
        let Some(secret) = self.secret_param else {
            return self.url.to_string();
        };

        let mut url = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == secret { "***".into() } else { v.into_owned() };
                (k.into_owned(), v)
            })
            .collect();
        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Failure before a usable response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Outbound HTTP seam. Production uses [`ReqwestTransport`]; tests script responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> Result<TransportResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("career-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    // reqwest error strings can echo the request URL; keep only the kind.
    let error = error.without_url();
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_lowercased() {
        let url = Url::parse("https://example.test/v1").unwrap();
        let request = RequestDescriptor::new(Method::GET, url).with_header("X-Api-Key", "k");
        assert_eq!(request.headers.get("x-api-key").map(String::as_str), Some("k"));
    }

    #[test]
    fn test_redacted_url_masks_secret_param_only() {
        let url = Url::parse("https://example.test/v1?q=rust&key=secret-123").unwrap();
        let mut request = RequestDescriptor::new(Method::GET, url);
        request.secret_param = Some("key");

        let redacted = request.redacted_url();
        assert!(!redacted.contains("secret-123"), "{redacted}");
        assert!(redacted.contains("q=rust"));
    }

    #[test]
    fn test_redacted_url_without_secret_is_unchanged() {
        let url = Url::parse("https://example.test/v1?q=rust").unwrap();
        let request = RequestDescriptor::new(Method::GET, url);
        assert_eq!(request.redacted_url(), "https://example.test/v1?q=rust");
    }

    mod reqwest_transport {
        use super::*;
        use httpmock::prelude::*;
        use serde_json::json;

        fn descriptor(method: Method, url: &str) -> RequestDescriptor {
            RequestDescriptor::new(method, Url::parse(url).unwrap())
        }

        #[tokio::test]
        async fn test_sends_headers_and_json_body() {
            let server = MockServer::start_async().await;
            let mock = server
                .mock_async(|when, then| {
                    when.method(POST)
                        .path("/v2/everything")
                        .header("x-api-key", "news-key")
                        .header("authorization", "Bearer market-key")
                        .json_body(json!({"q": "rust jobs"}));
                    then.status(200).body(r#"{"status":"ok"}"#);
                })
                .await;

            let request = descriptor(Method::POST, &server.url("/v2/everything"))
                .with_header("X-Api-Key", "news-key")
                .with_header("authorization", "Bearer market-key")
                .with_json(json!({"q": "rust jobs"}));
            let response = ReqwestTransport::new().unwrap().execute(&request).await.unwrap();

            mock.assert_async().await;
            assert_eq!(response.status, 200);
            assert_eq!(response.body, r#"{"status":"ok"}"#);
        }

        #[tokio::test]
        async fn test_error_status_keeps_body() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/v2/snapshot");
                    then.status(503).body("upstream maintenance");
                })
                .await;

            let request = descriptor(Method::GET, &server.url("/v2/snapshot"));
            let response = ReqwestTransport::new().unwrap().execute(&request).await.unwrap();

            assert_eq!(response.status, 503);
            assert_eq!(response.body, "upstream maintenance");
        }

        #[tokio::test]
        async fn test_refused_connection_is_a_connect_error() {
            let request = descriptor(Method::GET, "http://127.0.0.1:1/unreachable");
            let err = ReqwestTransport::new().unwrap().execute(&request).await.unwrap_err();
            assert!(matches!(err, TransportError::Connect(_)), "{err:?}");
        }

        #[tokio::test]
        async fn test_slow_upstream_is_a_timeout() {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/slow");
                    then.status(200).delay(Duration::from_secs(2)).body("{}");
                })
                .await;

            let request = descriptor(Method::GET, &server.url("/slow"))
                .with_timeout(Duration::from_millis(100));
            let err = ReqwestTransport::new().unwrap().execute(&request).await.unwrap_err();
            assert!(matches!(err, TransportError::Timeout), "{err:?}");
        }
    }
}
