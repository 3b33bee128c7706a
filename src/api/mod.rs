// Magento API module.
// Request orchestration, transport seam, and response normalization.

pub mod client;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use transport::{HttpTransport, ReqwestTransport, TransportResponse};
pub use types::{ApiResponse, Method};
