// HTTP transport seam.
// The client hands fully prepared requests to a transport; tests substitute a mock.

use async_trait::async_trait;
use reqwest::Client;

use super::types::Method;

/// Raw response handed back by a transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one prepared request and returns the raw status and body.
///
/// Timeouts and cancellation belong to the transport, not the client: a
/// timed-out or cancelled exchange surfaces as the error description.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> std::result::Result<TransportResponse, String>;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> std::result::Result<TransportResponse, String> {
        let mut request = self.client.request(method.into(), url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|err| err.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| err.to_string())?;

        Ok(TransportResponse { status, body })
    }
}
