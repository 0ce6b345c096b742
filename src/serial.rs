//! Certificate serial numbers.

use rand::Rng;
use sha1::{Digest, Sha1};
use time::OffsetDateTime;

use crate::error::{MintError, Result};

/// Digest bytes kept in a derived serial; with the zero prefix the serial is
/// exactly 20 octets, the RFC 5280 ceiling.
const SERIAL_DIGEST_BYTES: usize = 19;

/// Longest serial, in encoded octets, a certificate may carry.
const MAX_SERIAL_OCTETS: usize = 20;

/// Derive a fresh serial number from `namespace`.
///
/// Hashes the namespace together with the current time and a random nonce,
/// and prefixes a zero byte so the DER INTEGER is never negative. Uniqueness
/// is probabilistic.
pub fn derive_serial_number(namespace: &str) -> Vec<u8> {
    let nonce = format!(
        ".{}.{}",
        OffsetDateTime::now_utc().unix_timestamp_nanos(),
        rand::rng().random::<u64>()
    );
    let digest = Sha1::new()
        .chain_update(namespace.as_bytes())
        .chain_update(nonce.as_bytes())
        .finalize();

    let mut serial = Vec::with_capacity(1 + SERIAL_DIGEST_BYTES);
    serial.push(0);
    serial.extend_from_slice(&digest[..SERIAL_DIGEST_BYTES]);
    serial
}

/// Parse a caller-supplied serial number written in hex.
///
/// Accepts an optional `0x` prefix and colon separators. The result is the
/// minimal positive big-endian encoding (a zero byte is kept in front when
/// the high bit is set).
pub fn parse_serial_number(serial: &str) -> Result<Vec<u8>> {
    let trimmed = serial.trim();
    let mut digits: String = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != ':')
        .collect();
    if digits.is_empty() {
        return Err(MintError::InvalidInput("empty serial number".to_string()));
    }
    if digits.len() % 2 == 1 {
        digits.insert(0, '0');
    }

    let bytes = hex::decode(&digits)
        .map_err(|e| MintError::InvalidInput(format!("serial number {serial:?}: {e}")))?;
    let significant = match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => {
            return Err(MintError::InvalidInput(
                "serial number must be positive".to_string(),
            ));
        }
    };

    let mut encoded = Vec::with_capacity(significant.len() + 1);
    if significant[0] & 0x80 != 0 {
        encoded.push(0);
    }
    encoded.extend_from_slice(significant);
    if encoded.len() > MAX_SERIAL_OCTETS {
        return Err(MintError::InvalidInput(format!(
            "serial number is {} octets, at most {MAX_SERIAL_OCTETS} allowed",
            encoded.len()
        )));
    }
    Ok(encoded)
}
