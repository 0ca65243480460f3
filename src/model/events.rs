use serde::{Deserialize, Serialize};

///
/// A notification sent when a new credential has been registered.
///
#[derive(Debug, Deserialize, Serialize)]
pub struct CredentialCreated {
    pub credential_id: String
}

///
/// A notification sent when a credential has failed to authenticate enough
/// times inside the attempts window to be temporarily locked out.
///
#[derive(Debug, Deserialize, Serialize)]
pub struct AccountLocked {
    pub credential_id: String,
    pub minutes_remaining: i64,
}

///
/// A notification sent when a two-factor enrolment is confirmed.
///
#[derive(Debug, Deserialize, Serialize)]
pub struct TwoFactorEnabled {
    pub credential_id: String
}

///
/// A notification sent when a credential discards its two-factor secret
/// (which also invalidates all of its recovery codes).
///
#[derive(Debug, Deserialize, Serialize)]
pub struct TwoFactorDisabled {
    pub credential_id: String
}

///
/// A notification sent when a fresh recovery code set replaces the old one.
///
#[derive(Debug, Deserialize, Serialize)]
pub struct RecoveryCodesRegenerated {
    pub credential_id: String
}

///
/// A notification sent when every session for a credential is revoked -
/// password change or an explicit "log out everywhere".
///
#[derive(Debug, Deserialize, Serialize)]
pub struct SessionsRevoked {
    pub credential_id: String,
    pub revoked: u64,
}
