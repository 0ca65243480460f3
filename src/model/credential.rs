use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use crate::utils::errors::{ErrorCode, WardenError};

///
/// A principal capable of authenticating. Created at account creation, never
/// deleted while sessions reference it; only the phc mutates (password
/// change).
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Credential {
    pub credential_id: String,
    pub email: String,
    pub phc: String,
    pub active: bool,
    pub created_on: bson::DateTime,
}

///
/// Emails are matched case-insensitively - normalise before storing or looking up.
///
pub fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

///
/// Hash a plain text password into a PHC string (Argon2id).
///
/// Highly CPU-bound - callers must run this on the blocking worker pool.
///
pub fn hash_password(plain_text_password: &str) -> Result<String, WardenError> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default().hash_password(plain_text_password.as_bytes(), &salt)?;
    Ok(phc.to_string())
}

///
/// Validate a plain text password against a stored PHC string.
///
/// Also CPU-bound - blocking worker pool, same as hashing.
///
pub fn verify_password(plain_text_password: &str, phc: &str) -> Result<bool, WardenError> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| ErrorCode::InvalidPHCFormat.with_msg(&format!("The stored hash is invalid: {}", e)))?;

    match Argon2::default().verify_password(plain_text_password.as_bytes(), &parsed) {
        Ok(())                                        => Ok(true),
        Err(argon2::password_hash::Error::Password)   => Ok(false),
        Err(other)                                    => Err(WardenError::from(other)),
    }
}
