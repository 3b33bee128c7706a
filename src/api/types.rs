// Request and response types for the API client.
// Defines the method enum and the uniform `{error, result}` call result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// HTTP methods accepted by the API.
///
/// Parsed case-insensitively at the boundary, rendered upper-case on the
/// wire. Anything else is rejected up front instead of being dispatched on
/// raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Only GET responses are memoized.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Uniform call result.
///
/// `error` is true for transport failures and for any status other than 200.
/// `result` holds the decoded JSON body when the body parses, otherwise the
/// raw response text as a JSON string. Serializable so GET results can
/// round-trip through the cache unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub error: bool,
    pub result: Value,
}

impl ApiResponse {
    /// Normalize an HTTP response: non-200 is an error, the body is decoded
    /// as JSON when possible and kept as raw text otherwise.
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        let result = serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));
        Self {
            error: status != 200,
            result,
        }
    }

    /// Normalize a transport failure (no response was obtained).
    pub(crate) fn transport_failure(description: String) -> Self {
        Self {
            error: true,
            result: Value::String(description),
        }
    }
}
