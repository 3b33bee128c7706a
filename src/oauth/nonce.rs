// Injectable time and nonce sources for request signing.
// Defaults use the system clock and the operating system RNG.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::warn;

/// Supplies the `oauth_timestamp` value.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn unix_seconds(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// Supplies the `oauth_nonce` value, one fresh nonce per request.
pub trait NonceSource: Send + Sync {
    fn nonce(&self) -> String;
}

/// 16 bytes from the OS RNG, hex-encoded.
///
/// If the OS RNG is unavailable the source degrades to a pseudo-nonce derived
/// from the clock, the process id, and a counter. That weakens replay
/// resistance, so every degraded nonce is reported with a warning.
#[derive(Debug, Default)]
pub struct SecureNonce {
    fallback_counter: AtomicU64,
}

impl NonceSource for SecureNonce {
    fn nonce(&self) -> String {
        let mut bytes = [0u8; 16];
        match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => hex::encode(bytes),
            Err(err) => {
                warn!(error = %err, "secure randomness unavailable, using degraded pseudo-nonce");
                self.pseudo_nonce()
            }
        }
    }
}

impl SecureNonce {
    fn pseudo_nonce(&self) -> String {
        let counter = self.fallback_counter.fetch_add(1, Ordering::Relaxed);
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(process::id().to_le_bytes());
        hasher.update(counter.to_le_bytes());
        let digest = hasher.finalize();

        hex::encode(&digest[..16])
    }
}
