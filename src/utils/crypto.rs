use rand::Rng;
use aes_gcm::{Aes256Gcm, Nonce, aead::{Aead, KeyInit}};
use crate::utils::errors::{ErrorCode, WardenError};

const NONCE_LEN: usize = 12;

///
/// Encrypts-at-rest the two-factor shared secrets and recovery codes.
///
/// AES-256-GCM under the service master key. Blobs are stored as
/// base64(nonce || ciphertext) so they can live in ordinary BSON string
/// fields. Lockout and session documents are NOT encrypted - they carry
/// plain timestamps and counters with no confidentiality requirement.
///
pub struct BlobCipher {
    key: [u8; 32],
}

impl BlobCipher {
    ///
    /// Build a cipher from the hex-encoded master key in the configuration.
    ///
    pub fn from_hex_key(master_key: &str) -> Result<Self, WardenError> {
        let bytes = hex::decode(master_key)
            .map_err(|e| ErrorCode::InvalidMasterKey.with_msg(&format!("The master key is not valid hex: {}", e)))?;

        if bytes.len() != 32 {
            return Err(ErrorCode::InvalidMasterKey
                .with_msg(&format!("The master key must be 32 bytes, got {}", bytes.len())))
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(BlobCipher { key })
    }

    pub fn encrypt(&self, plain: &[u8]) -> Result<String, WardenError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| ErrorCode::EncryptionFailed.with_msg(&format!("Unable to create cipher: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce_bytes[..]);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher.encrypt(nonce, plain)
            .map_err(|e| ErrorCode::EncryptionFailed.with_msg(&format!("Unable to encrypt: {}", e)))?;

        // Prepend the nonce so the blob is self-contained.
        let mut blob = nonce_bytes.to_vec();
        blob.extend(ciphertext);

        Ok(base64::encode(&blob))
    }

    pub fn decrypt(&self, blob: &str) -> Result<Vec<u8>, WardenError> {
        let blob = base64::decode(blob)
            .map_err(|e| ErrorCode::DecryptionFailed.with_msg(&format!("Blob is not valid base64: {}", e)))?;

        if blob.len() < NONCE_LEN {
            return Err(ErrorCode::DecryptionFailed.with_msg("Blob is too short to contain a nonce"))
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| ErrorCode::DecryptionFailed.with_msg(&format!("Unable to create cipher: {}", e)))?;

        let nonce = Nonce::from_slice(&blob[..NONCE_LEN]);
        cipher.decrypt(nonce, &blob[NONCE_LEN..])
            .map_err(|e| ErrorCode::DecryptionFailed.with_msg(&format!("Unable to decrypt: {}", e)))
    }

    ///
    /// Decrypt a blob that is known to contain utf-8 (a base32 secret or a recovery code).
    ///
    pub fn decrypt_str(&self, blob: &str) -> Result<String, WardenError> {
        String::from_utf8(self.decrypt(blob)?)
            .map_err(|e| ErrorCode::DecryptionFailed.with_msg(&format!("Decrypted blob is not utf-8: {}", e)))
    }
}
