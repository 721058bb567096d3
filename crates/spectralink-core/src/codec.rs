//! Obfuscation codec for wire tokens.
//!
//! A tagged token is `🔒[<32 hex>]<base64 of the UTF-8 plaintext>`. The hex
//! segment is 16 fresh random bytes per call and carries no meaning. This is a
//! reversible encoding with a public marker, not encryption: anyone holding a
//! token can recover the plaintext.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;
use tracing::{error, warn};

/// Structural marker that opens every tagged token.
pub const MARKER: &str = "🔒[";

/// Returned by [`decode`] for a well-formed token whose payload is corrupt.
pub const DECRYPTION_FAILED: &str = "[Decryption Failed]";

/// Prefix of the passthrough token produced when no secure random source exists.
pub const ENCRYPTION_FAILED_PREFIX: &str = "[ENCRYPTION FAILED] ";

/// Length of the random segment in bytes (rendered as twice as many hex chars).
pub const NONCE_LEN: usize = 16;

/// Shared by `decode` and `is_tagged`; the two predicates must never drift.
static TAGGED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^🔒\[[a-fA-F0-9]{32}\](.*)$").unwrap());

/// Classification of a wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Does not match the tagged grammar; the value is already plain.
    Plain,
    /// Tagged and decoded cleanly.
    Tagged(String),
    /// Tagged, but the payload is not valid base64 or not UTF-8.
    Corrupt,
}

/// Encode `plain` into a tagged token using the OS random source.
pub fn encode(plain: &str) -> String {
    encode_with(&mut OsRng, plain)
}

/// Encode with an explicit random source.
///
/// If the source fails, returns `[ENCRYPTION FAILED] <plain>` so no data is lost.
pub fn encode_with<R: RngCore + ?Sized>(rng: &mut R, plain: &str) -> String {
    let mut nonce = [0u8; NONCE_LEN];
    if let Err(e) = rng.try_fill_bytes(&mut nonce) {
        error!("Secure random source unavailable: {}", e);
        return format!("{}{}", ENCRYPTION_FAILED_PREFIX, plain);
    }

    format!(
        "{}{}]{}",
        MARKER,
        hex::encode(nonce),
        STANDARD.encode(plain.as_bytes())
    )
}

/// Classify and, when possible, decode a wire string.
pub fn inspect(token: &str) -> Decoded {
    let Some(caps) = TAGGED_TOKEN.captures(token) else {
        return Decoded::Plain;
    };
    let payload = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    let bytes = match STANDARD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Tagged token has invalid payload: {}", e);
            return Decoded::Corrupt;
        }
    };

    match String::from_utf8(bytes) {
        Ok(plain) => Decoded::Tagged(plain),
        Err(e) => {
            warn!("Tagged token payload is not UTF-8: {}", e);
            Decoded::Corrupt
        }
    }
}

/// Decode a tagged token.
///
/// `None` when the token is not tagged; [`DECRYPTION_FAILED`] when it is tagged
/// but the payload cannot be recovered.
pub fn decode(token: &str) -> Option<String> {
    match inspect(token) {
        Decoded::Plain => None,
        Decoded::Tagged(plain) => Some(plain),
        Decoded::Corrupt => Some(DECRYPTION_FAILED.to_string()),
    }
}

/// Pure structural check; agrees exactly with `decode(token).is_some()`.
pub fn is_tagged(token: &str) -> bool {
    TAGGED_TOKEN.is_match(token)
}
