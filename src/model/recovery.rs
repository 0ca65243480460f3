use rand::Rng;

// Upper-case alphanumerics - transcribable over the phone, and never
// mistakable for a 6-digit TOTP code at the verification prompt.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const GROUP_LEN: usize = 10;
const SEPARATOR: char = '-';

pub const CODES_PER_SET: usize = 8;

///
/// Generate a fresh set of single-use recovery codes - two 10-character
/// random groups joined by a separator, eg. "K7Q2MWKJ3D-9TPL2XV0AB".
///
/// The caller encrypts them for storage; the plaintext is shown to the user
/// exactly once.
///
pub fn generate_set() -> Vec<String> {
    (0..CODES_PER_SET).map(|_| generate_code()).collect()
}

fn generate_code() -> String {
    format!("{}{}{}", generate_group(), SEPARATOR, generate_group())
}

fn generate_group() -> String {
    let mut rng = rand::thread_rng();
    (0..GROUP_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

///
/// Codes are compared after normalisation so a user retyping one may vary
/// case and drop the separator.
///
pub fn normalise(code: &str) -> String {
    code.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
