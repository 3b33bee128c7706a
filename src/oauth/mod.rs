// OAuth 1.0a signing module.
// Produces the Authorization header value for signed Magento API requests.

pub mod nonce;
pub mod signer;

pub use nonce::{Clock, NonceSource, SecureNonce, SystemClock};
pub use signer::{Credentials, Signer};
