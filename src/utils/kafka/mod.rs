#[cfg(feature = "kafka")]
pub mod producer;

///
/// Topics other systems can subscribe to for security-relevant happenings.
///
/// These are notification-only - nothing in Warden consumes them, so there is
/// no consumer half and no topic pre-creation here.
///
pub mod prelude {
    pub const TOPIC_CREDENTIAL_CREATED:         &str = "credential.created";
    pub const TOPIC_ACCOUNT_LOCKED:             &str = "credential.account.locked";
    pub const TOPIC_TWO_FACTOR_ENABLED:         &str = "credential.two_factor.enabled";
    pub const TOPIC_TWO_FACTOR_DISABLED:        &str = "credential.two_factor.disabled";
    pub const TOPIC_RECOVERY_CODES_REGENERATED: &str = "credential.recovery_codes.regenerated";
    pub const TOPIC_SESSIONS_REVOKED:           &str = "credential.sessions.revoked";
}
