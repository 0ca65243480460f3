use serde::{Deserialize, Serialize};

///
/// The two-factor enrolment for one credential.
///
/// Created in a pending state (confirmed_on = None) by setup; becomes
/// confirmed only once the user has proven possession of the shared secret;
/// deleted outright on disable. The secret and every recovery code are
/// encrypted blobs - plaintext exists only transiently in memory.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TwoFactor {
    pub credential_id: String,
    pub secret: String,
    pub confirmed_on: Option<bson::DateTime>,
    pub recovery_codes: Vec<RecoveryCode>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RecoveryCode {
    pub code: String,
    pub consumed: bool,
}

impl TwoFactor {
    pub fn pending(credential_id: &str, encrypted_secret: String, encrypted_codes: Vec<String>) -> Self {
        TwoFactor {
            credential_id: credential_id.to_string(),
            secret: encrypted_secret,
            confirmed_on: None,
            recovery_codes: encrypted_codes.into_iter()
                .map(|code| RecoveryCode { code, consumed: false })
                .collect(),
        }
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed_on.is_some()
    }

    pub fn remaining_codes(&self) -> u32 {
        self.recovery_codes.iter().filter(|code| !code.consumed).count() as u32
    }
}
