// OAuth 1.0a request signing.
// Builds the canonical base string and the HMAC-SHA256 Authorization header value.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

use super::nonce::{Clock, NonceSource, SecureNonce, SystemClock};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_METHOD: &str = "HMAC-SHA256";
const OAUTH_VERSION: &str = "1.0";

/// Credentials for one Magento integration.
///
/// Used only to compute signatures; never logged and never cached. The
/// `Debug` impl redacts both secrets.
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Produces the `Authorization` header value for one request.
///
/// Pure apart from the injected clock and nonce source; no network or disk
/// access. The returned value does not carry the `OAuth ` prefix, the caller
/// adds it when assembling the header.
pub struct Signer {
    credentials: Credentials,
    clock: Box<dyn Clock>,
    nonce: Box<dyn NonceSource>,
}

impl Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_sources(
            credentials,
            Box::new(SystemClock),
            Box::new(SecureNonce::default()),
        )
    }

    /// Build a signer over explicit time and nonce sources, so tests can
    /// pin both and assert exact signatures.
    pub fn with_sources(
        credentials: Credentials,
        clock: Box<dyn Clock>,
        nonce: Box<dyn NonceSource>,
    ) -> Self {
        Self {
            credentials,
            clock,
            nonce,
        }
    }

    /// Sign one request and return the Authorization header value.
    ///
    /// Query parameters participate in the signature base string; the request
    /// body never does. Parameters named `oauth_*` are rejected rather than
    /// silently overriding a protocol field.
    pub fn sign(&self, method: &str, url: &str, params: &[(String, String)]) -> Result<String> {
        for (name, _) in params {
            if name.starts_with("oauth_") {
                return Err(Error::ReservedParameter(name.clone()));
            }
        }

        let mut oauth: Vec<(String, String)> = vec![
            (
                "oauth_consumer_key".into(),
                self.credentials.consumer_key.clone(),
            ),
            ("oauth_nonce".into(), self.nonce.nonce()),
            ("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
            (
                "oauth_timestamp".into(),
                self.clock.unix_seconds().to_string(),
            ),
            ("oauth_token".into(), self.credentials.access_token.clone()),
            ("oauth_version".into(), OAUTH_VERSION.into()),
        ];

        // Caller parameters enter the set already percent-encoded; the base
        // string encodes the whole query string once more. The upstream
        // verifier expects this double encoding.
        for (name, value) in params {
            oauth.push((
                percent_encode(name).into_owned(),
                percent_encode(value).into_owned(),
            ));
        }

        let canonical = byte_value_ordered_query(&oauth);
        let base = format!(
            "{}&{}&{}",
            method,
            percent_encode(url),
            percent_encode(&canonical)
        );

        // Secrets are joined with a bare `&` and NOT percent-encoded. The
        // upstream verifier derives its key the same way, so encoding them
        // here would break interoperability.
        let key = format!(
            "{}&{}",
            self.credentials.consumer_secret, self.credentials.access_token_secret
        );

        let mut mac =
            HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
        mac.update(base.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        oauth.push(("oauth_signature".into(), signature));

        Ok(header_value(&oauth))
    }
}

/// RFC 3986 percent-encoding with `~` left bare.
pub(crate) fn percent_encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Concatenate the parameter set as `key=value` pairs joined by `&`,
/// ordered by byte-wise natural comparison of the names. Repeated names
/// are emitted as repeated pairs with their values natural-sorted.
fn byte_value_ordered_query(params: &[(String, String)]) -> String {
    let mut entries: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    entries.sort_by(|a, b| natural_cmp(a.0, b.0).then_with(|| natural_cmp(a.1, b.1)));

    entries
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Serialize the final set, including `oauth_signature`, as comma-joined
/// percent-encoded `key=value` pairs.
fn header_value(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Byte-wise natural-order comparison: digit runs compare numerically
/// (`item2` sorts before `item10`), everything else byte by byte.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let mut end_a = i;
            while end_a < a.len() && a[end_a].is_ascii_digit() {
                end_a += 1;
            }
            let mut end_b = j;
            while end_b < b.len() && b[end_b].is_ascii_digit() {
                end_b += 1;
            }

            // Leading zeros do not change the numeric value.
            let mut start_a = i;
            while start_a < end_a - 1 && a[start_a] == b'0' {
                start_a += 1;
            }
            let mut start_b = j;
            while start_b < end_b - 1 && b[start_b] == b'0' {
                start_b += 1;
            }

            let run_a = &a[start_a..end_a];
            let run_b = &b[start_b..end_b];
            let ord = run_a.len().cmp(&run_b.len()).then_with(|| run_a.cmp(run_b));
            if ord != Ordering::Equal {
                return ord;
            }

            i = end_a;
            j = end_b;
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::nonce::{Clock, NonceSource};

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn unix_seconds(&self) -> u64 {
            self.0
        }
    }

    struct FixedNonce(&'static str);

    impl NonceSource for FixedNonce {
        fn nonce(&self) -> String {
            self.0.to_string()
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            access_token: "at".to_string(),
            access_token_secret: "ats".to_string(),
        }
    }

    fn pinned_signer() -> Signer {
        Signer::with_sources(
            credentials(),
            Box::new(FixedClock(1_700_000_000)),
            Box::new(FixedNonce("abcdef0123456789abcdef0123456789")),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_signing_is_deterministic_under_fixed_sources() {
        let signer = pinned_signer();
        let query = params(&[("searchCriteria[pageSize]", "10")]);

        let first = signer
            .sign("GET", "https://shop.example.com/rest/V1/orders", &query)
            .unwrap();
        let second = signer
            .sign("GET", "https://shop.example.com/rest/V1/orders", &query)
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_parameter_insertion_order_does_not_change_signature() {
        let signer = pinned_signer();
        let forward = params(&[("b", "2"), ("a", "1"), ("c", "3")]);
        let backward = params(&[("c", "3"), ("a", "1"), ("b", "2")]);

        let first = signer.sign("GET", "https://api.example.com/x", &forward);
        let second = signer.sign("GET", "https://api.example.com/x", &backward);

        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn test_signature_is_expected_hmac_of_base_string() {
        let signer = pinned_signer();
        let query = params(&[("sku", "WS~12 034")]);

        let header = signer
            .sign("GET", "https://shop.example.com/rest/V1/products", &query)
            .unwrap();

        // Base string assembled by hand: the merged set is sorted, the query
        // parameter is double-encoded, the whole query string encoded once more.
        let canonical = "oauth_consumer_key=ck\
            &oauth_nonce=abcdef0123456789abcdef0123456789\
            &oauth_signature_method=HMAC-SHA256\
            &oauth_timestamp=1700000000\
            &oauth_token=at\
            &oauth_version=1.0\
            &sku=WS~12%20034";
        let base = format!(
            "GET&{}&{}",
            percent_encode("https://shop.example.com/rest/V1/products"),
            percent_encode(canonical)
        );
        let mut mac = HmacSha256::new_from_slice(b"cs&ats").unwrap();
        mac.update(base.as_bytes());
        let expected = BASE64.encode(mac.finalize().into_bytes());

        let expected_field = format!("oauth_signature={}", percent_encode(&expected));
        assert!(
            header.ends_with(&expected_field),
            "header {header:?} should end with {expected_field:?}"
        );
    }

    #[test]
    fn test_tilde_survives_encoding() {
        let signer = pinned_signer();
        let query = params(&[("path", "~user/file~1")]);

        let header = signer
            .sign("GET", "https://api.example.com/files", &query)
            .unwrap();

        assert!(header.contains("~user"), "tilde must stay bare: {header}");
        assert!(!header.contains("%7E"), "tilde must never appear encoded");
    }

    #[test]
    fn test_reserved_oauth_parameter_is_rejected() {
        let signer = pinned_signer();
        let query = params(&[("oauth_signature_method", "PLAINTEXT")]);

        let err = signer
            .sign("GET", "https://api.example.com/x", &query)
            .unwrap_err();

        assert!(matches!(err, Error::ReservedParameter(name) if name == "oauth_signature_method"));
    }

    #[test]
    fn test_header_contains_all_oauth_fields() {
        let signer = pinned_signer();

        let header = signer
            .sign("POST", "https://api.example.com/x", &[])
            .unwrap();

        for field in [
            "oauth_consumer_key=ck",
            "oauth_nonce=abcdef0123456789abcdef0123456789",
            "oauth_signature_method=HMAC-SHA256",
            "oauth_timestamp=1700000000",
            "oauth_token=at",
            "oauth_version=1.0",
            "oauth_signature=",
        ] {
            assert!(header.contains(field), "missing {field} in {header}");
        }
        assert_eq!(header.matches(',').count(), 6, "seven comma-joined fields");
        assert!(!header.starts_with("OAuth"), "prefix belongs to the caller");
    }

    #[test]
    fn test_natural_order_sorts_digit_runs_numerically() {
        assert_eq!(natural_cmp("item2", "item10"), Ordering::Less);
        assert_eq!(natural_cmp("item10", "item2"), Ordering::Greater);
        assert_eq!(natural_cmp("item02", "item2"), Ordering::Equal);
        assert_eq!(natural_cmp("a", "ab"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
        assert_eq!(natural_cmp("a9z", "a10a"), Ordering::Less);
    }

    #[test]
    fn test_repeated_parameters_emit_sorted_pairs() {
        let set = params(&[("tag", "zeta"), ("tag", "alpha"), ("aaa", "1")]);
        let canonical = byte_value_ordered_query(&set);
        assert_eq!(canonical, "aaa=1&tag=alpha&tag=zeta");
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("ck"));
        assert!(!rendered.contains("cs"), "consumer secret leaked");
        assert!(!rendered.contains("ats"), "token secret leaked");
        assert!(rendered.contains("<redacted>"));
    }
}
