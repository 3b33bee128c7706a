// Magento API HTTP client.
// Signs each request, memoizes GET responses, and normalizes results.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::cache::ApiCache;
use crate::error::Result;
use crate::oauth::{Credentials, Signer};

use super::transport::{HttpTransport, ReqwestTransport, TransportResponse};
use super::types::{ApiResponse, Method};

/// Client for one Magento integration.
///
/// Orchestrates signing, the optional response cache, and delegation to the
/// transport. HTTP-level failures never escape as errors: they come back as
/// `ApiResponse { error: true, .. }` so callers always receive a value.
pub struct ApiClient<T: HttpTransport = ReqwestTransport> {
    signer: Signer,
    transport: T,
    cache: Option<ApiCache>,
}

impl ApiClient {
    /// Client without response caching.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            signer: Signer::new(credentials),
            transport: ReqwestTransport::default(),
            cache: None,
        }
    }

    /// Client that memoizes successful GET responses in `cache`.
    pub fn with_cache(credentials: Credentials, cache: ApiCache) -> Self {
        Self {
            signer: Signer::new(credentials),
            transport: ReqwestTransport::default(),
            cache: Some(cache),
        }
    }
}

impl<T: HttpTransport> ApiClient<T> {
    /// Client over a custom signer and transport. Tests use this to pin the
    /// clock and nonce and to script responses.
    pub fn with_parts(signer: Signer, transport: T, cache: Option<ApiCache>) -> Self {
        Self {
            signer,
            transport,
            cache,
        }
    }

    pub fn cache(&self) -> Option<&ApiCache> {
        self.cache.as_ref()
    }

    pub fn cache_mut(&mut self) -> Option<&mut ApiCache> {
        self.cache.as_mut()
    }

    pub async fn get(&mut self, url: &str, params: &[(String, String)]) -> Result<ApiResponse> {
        self.call(Method::Get, url, None, params).await
    }

    pub async fn delete(&mut self, url: &str, params: &[(String, String)]) -> Result<ApiResponse> {
        self.call(Method::Delete, url, None, params).await
    }

    pub async fn post(&mut self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.call(Method::Post, url, Some(body), &[]).await
    }

    pub async fn put(&mut self, url: &str, body: &Value) -> Result<ApiResponse> {
        self.call(Method::Put, url, Some(body), &[]).await
    }

    /// One signed API exchange.
    ///
    /// GET calls with a configured cache are served from the cache when the
    /// request fingerprint hits, and successful GET responses are written
    /// back before returning. Signing and cache-setup problems abort with
    /// `Err`; everything HTTP-level is data in the returned response.
    pub async fn call(
        &mut self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        params: &[(String, String)],
    ) -> Result<ApiResponse> {
        let fingerprint = fingerprint(method, url, body, params);

        if method.is_cacheable() {
            if let Some(cache) = self.cache.as_mut() {
                if let Some(response) = cache.get::<ApiResponse>(&fingerprint) {
                    debug!(%method, url, "cache hit");
                    return Ok(response);
                }
                debug!(%method, url, "cache miss");
            }
        }

        let authorization = format!("OAuth {}", self.signer.sign(method.as_str(), url, params)?);
        let headers = vec![
            ("Authorization".to_string(), authorization),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        let wire_body = body.map(serde_json::to_string).transpose()?;

        let response = match self
            .transport
            .send(method, &request_url(url, params), &headers, wire_body)
            .await
        {
            Ok(TransportResponse { status, body }) => ApiResponse::from_body(status, &body),
            Err(description) => ApiResponse::transport_failure(description),
        };

        if !response.error && method.is_cacheable() {
            if let Some(cache) = self.cache.as_mut() {
                cache.set(&fingerprint, &response)?;
                debug!(%method, url, "cache populated");
            }
        }

        Ok(response)
    }
}

/// Append the query string to the target URL. Parameters ride both here and
/// in the signature base string; the body only rides the wire payload.
fn request_url(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", url, query)
}

/// Stable fingerprint of one call, used as the cache key. Parameters are
/// sorted first so insertion order cannot split cache entries.
fn fingerprint(method: Method, url: &str, body: Option<&Value>, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(url.as_bytes());
    hasher.update([0]);
    if let Some(body) = body {
        hasher.update(body.to_string().as_bytes());
    }
    hasher.update([0]);
    for (key, value) in &sorted {
        hasher.update(key.as_bytes());
        hasher.update([0]);
        hasher.update(value.as_bytes());
        hasher.update([0]);
    }

    hex::encode(hasher.finalize())
}
