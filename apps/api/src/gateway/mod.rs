/// External API Gateway: the single chokepoint for every outbound provider call.
///
/// No handler or adapter talks to reqwest directly. Each provider gets one
/// `Gateway`, which checks the key, serves the response cache, bounds the call
/// with a deadline and classifies every failure into an [`ErrorKind`].
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod error;
pub mod provider;
pub mod transport;

#[cfg(test)]
pub mod testing;

use crate::gateway::cache::{CacheKey, ResponseCache};
use crate::gateway::clock::Clock;
use crate::gateway::error::{classify_status, ClassifiedError, ErrorKind};
use crate::gateway::provider::{AuthStyle, ProviderConfig};
use crate::gateway::transport::{HttpTransport, RequestDescriptor};

/// Longest slice of an upstream error body kept in a classified message.
const ERROR_BODY_PREVIEW: usize = 200;

pub struct Gateway {
    provider: ProviderConfig,
    api_key: Option<String>,
    transport: Arc<dyn HttpTransport>,
    cache: Option<ResponseCache>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl Gateway {
    /// A blank key is treated the same as an absent one.
    pub fn new(
        provider: ProviderConfig,
        api_key: Option<String>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let cache = provider
            .cache_window
            .map(|window| ResponseCache::new(window, Arc::clone(&clock)));

        Self {
            provider,
            api_key,
            transport,
            cache,
            clock,
            timeout,
        }
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Today's date on the gateway's clock, for building date-ranged queries.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ClassifiedError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| {
                ClassifiedError::key_missing(self.provider.name, self.provider.api_key_env_var)
            })
    }

    /// Resolves `base_url + path` with `params` and applies the provider's auth style.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<RequestDescriptor, ClassifiedError> {
        let key = self.api_key()?;

        let mut url = Url::parse(&format!("{}{}", self.provider.base_url, path)).map_err(|e| {
            ClassifiedError::bad_parameters(format!(
                "invalid {} URL for '{path}': {e}",
                self.provider.name
            ))
        })?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let request = match self.provider.auth_style {
            AuthStyle::HeaderBearer => RequestDescriptor::new(method, url)
                .with_header("authorization", format!("Bearer {key}")),
            AuthStyle::HeaderCustomKey(name) => {
                RequestDescriptor::new(method, url).with_header(name, key)
            }
            AuthStyle::QueryParam(name) => {
                url.query_pairs_mut().append_pair(name, key);
                let mut request = RequestDescriptor::new(method, url);
                request.secret_param = Some(name);
                request
            }
        };
        Ok(request.with_timeout(self.timeout))
    }

    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
        label: &str,
    ) -> Result<Arc<Value>, ClassifiedError> {
        let request = self
            .request(Method::GET, path, params)
            .map_err(|e| self.reject(label, e))?;
        self.fetch_endpoint(request, label).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: Value,
        label: &str,
    ) -> Result<Arc<Value>, ClassifiedError> {
        let request = self
            .request(Method::POST, path, &[])
            .map_err(|e| self.reject(label, e))?
            .with_json(body);
        self.fetch_endpoint(request, label).await
    }

    /// Issues `request`, returning the raw provider payload.
    ///
    /// Order: key check, cache lookup, deadline-bounded call, status
    /// classification, JSON parse, embedded-error check, cache insert.
    /// Only fully successful payloads reach the cache. Never retries.
    pub async fn fetch_endpoint(
        &self,
        request: RequestDescriptor,
        label: &str,
    ) -> Result<Arc<Value>, ClassifiedError> {
        self.api_key().map_err(|e| self.reject(label, e))?;

        let key = CacheKey::from_request(&request);
        if let Some(cache) = &self.cache {
            if let Some(payload) = cache.get(&key).await {
                debug!(provider = self.provider.name, endpoint = label, "cache hit");
                return Ok(payload);
            }
        }

        info!(
            provider = self.provider.name,
            endpoint = label,
            url = %request.redacted_url(),
            "fetching from upstream"
        );

        let call = self.transport.execute(&request);
        let response = match tokio::time::timeout(request.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(self.reject(
                    label,
                    ClassifiedError::network(format!("{} {e}", self.provider.name)),
                ))
            }
            Err(_) => {
                return Err(self.reject(
                    label,
                    ClassifiedError::network(format!(
                        "{} did not respond within {}s",
                        self.provider.name,
                        request.timeout.as_secs_f64()
                    )),
                ))
            }
        };

        if let Some(kind) = classify_status(response.status, self.provider.status_overrides) {
            let preview: String = response.body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(self.reject(
                label,
                ClassifiedError::new(
                    kind,
                    format!(
                        "{} returned status {}: {preview}",
                        self.provider.name, response.status
                    ),
                ),
            ));
        }

        let payload: Value = serde_json::from_str(&response.body).map_err(|e| {
            self.reject(
                label,
                ClassifiedError::unknown(format!(
                    "{} returned malformed JSON: {e}",
                    self.provider.name
                )),
            )
        })?;

        if let Some(error) = (self.provider.embedded_error)(&payload) {
            return Err(self.reject(label, error));
        }

        let payload = Arc::new(payload);
        if let Some(cache) = &self.cache {
            cache.insert(key, Arc::clone(&payload)).await;
            debug!(provider = self.provider.name, endpoint = label, "cached response");
        }
        Ok(payload)
    }

    fn reject(&self, label: &str, error: ClassifiedError) -> ClassifiedError {
        warn!(
            provider = self.provider.name,
            endpoint = label,
            kind = %error.kind(),
            "{}",
            error.message()
        );
        error
    }

    #[cfg(test)]
    async fn cached_entries(&self) -> usize {
        match &self.cache {
            Some(cache) => cache.len().await,
            None => 0,
        }
    }
}

/// Structured code from an embedded provider error, mapped through the status table.
pub fn kind_from_code(code: Option<u64>) -> ErrorKind {
    code.and_then(|c| u16::try_from(c).ok())
        .and_then(|c| classify_status(c, &[]))
        .unwrap_or(ErrorKind::Unknown)
}
