// Magento admin REST API client.
// Signs every request with an OAuth 1.0a HMAC-SHA256 signature and optionally
// memoizes GET responses in a file-backed cache with per-entry expiry.

pub mod api;
pub mod cache;
pub mod error;
pub mod oauth;

pub use api::{ApiClient, ApiResponse, HttpTransport, Method, ReqwestTransport, TransportResponse};
pub use cache::{ApiCache, CacheConfig};
pub use error::{Error, Result};
pub use oauth::{Credentials, Signer};
