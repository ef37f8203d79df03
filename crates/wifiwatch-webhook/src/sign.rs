//! Webhook request signature
//!
//! The endpoint verifies `sign = base64(HMAC-SHA256(key, ""))` where the key
//! is `"{timestamp}\n{secret}"` and the message is empty. The timestamp is
//! Unix seconds and must be within an hour of the server clock.

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use wifiwatch_core::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signature for a request sent at `timestamp` (Unix seconds)
pub fn sign(timestamp: i64, secret: &str) -> Result<String> {
    let key = format!("{timestamp}\n{secret}");
    let mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| Error::notification(format!("invalid signing key: {e}")))?;

    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
