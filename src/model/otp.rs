use rand::Rng;
use sha1::Sha1;
use hmac::{Hmac, Mac};
use subtle::ConstantTimeEq;
use chrono::{DateTime, Utc};
use crate::utils::errors::{ErrorCode, WardenError};

type HmacSha1 = Hmac<Sha1>;

// 160 bits of secret entropy - 32 base32 characters.
pub const SECRET_BYTES: usize = 20;

pub const TIME_STEP_SECONDS: i64 = 30;

// Accept codes from the adjacent time steps to absorb client clock skew.
const DRIFT_STEPS: i64 = 1;

const ALPHABET: base32::Alphabet = base32::Alphabet::RFC4648 { padding: false };

///
/// Generate a new shared secret - cryptographically random, base32-encoded
/// with the RFC 4648 alphabet, no padding.
///
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes[..]);
    base32::encode(ALPHABET, &bytes)
}

///
/// Decode a base32 secret permissively: the input is upper-cased and anything
/// outside the A-Z/2-7 alphabet (whitespace, dashes, '=' padding) is stripped
/// before decoding, to tolerate user-copied secrets.
///
pub fn decode_base32(secret: &str) -> Result<Vec<u8>, WardenError> {
    let cleaned: String = secret.to_uppercase()
        .chars()
        .filter(|c| matches!(c, 'A'..='Z' | '2'..='7'))
        .collect();

    let bytes = base32::decode(ALPHABET, &cleaned).unwrap_or_default();

    if bytes.is_empty() {
        return Err(ErrorCode::MalformedSecret.with_msg("The secret contains no decodable base32"))
    }

    Ok(bytes)
}

///
/// The TOTP time step for the given instant (RFC 6238, 30-second steps).
///
pub fn time_step(now: DateTime<Utc>) -> u64 {
    (now.timestamp() / TIME_STEP_SECONDS) as u64
}

///
/// Derive the 6-digit code for a time step (RFC 4226 with the RFC 6238 counter).
///
/// The counter is encoded as 8 big-endian bytes and HMAC-SHA1'd with the
/// secret as key; the low nibble of the final MAC byte selects a 4-byte
/// big-endian word which is sign-masked, reduced mod 1,000,000 and
/// zero-padded. This exact bit layout is what authenticator apps produce -
/// the unit tests pin it to the published RFC vectors.
///
pub fn derive_code(secret: &[u8], time_step: u64) -> Result<String, WardenError> {
    let mut mac = HmacSha1::new_from_slice(secret)
        .map_err(|_| ErrorCode::MalformedSecret.with_msg("The secret cannot key an HMAC"))?;
    mac.update(&time_step.to_be_bytes());
    let mac = mac.finalize().into_bytes();

    // Dynamic truncation (RFC 4226 section 5.3).
    let offset = (mac[mac.len() - 1] & 0x0f) as usize;
    let binary = ((mac[offset] & 0x7f) as u32) << 24
        | (mac[offset + 1] as u32) << 16
        | (mac[offset + 2] as u32) << 8
        | (mac[offset + 3] as u32);

    Ok(format!("{:06}", binary % 1_000_000))
}

///
/// Check a submitted code against the time steps {now-1, now, now+1},
/// giving plus/minus 30 seconds of clock-drift tolerance.
///
pub fn verify_with_drift(secret: &[u8], code: &str, now: DateTime<Utc>) -> Result<bool, WardenError> {
    let current = time_step(now) as i64;

    for drift in -DRIFT_STEPS..=DRIFT_STEPS {
        let step = current + drift;
        if step < 0 {
            continue
        }

        let expected = derive_code(secret, step as u64)?;
        if constant_time_eq(&expected, code) {
            return Ok(true)
        }
    }

    Ok(false)
}

///
/// The provisioning URI embedded in the enrolment QR code. The format is
/// consumed by standard authenticator apps and must not be altered.
///
pub fn provisioning_uri(issuer: &str, account: &str, secret: &str) -> String {
    format!("otpauth://totp/{}:{}?secret={}&issuer={}", issuer, account, secret, issuer)
}

///
/// Compare without an early exit so response times don't leak how much of a
/// code matched.
///
pub fn constant_time_eq(expected: &str, submitted: &str) -> bool {
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}
