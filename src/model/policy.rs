use chrono::Duration;
use crate::utils::config::Configuration;

///
/// The security policy - every timing and threshold the lockout, session and
/// two-factor components work with, built once at start-up and passed in by
/// the service context.
///
/// Collecting these here (rather than reading individual settings at call
/// sites) keeps the three components agreeing on timing and failure
/// semantics.
///
#[derive(Clone, Debug)]
pub struct SecurityPolicy {
    pub max_attempts: u32,           // Failed logins tolerated inside the attempts window.
    pub attempts_window: Duration,   // Failures older than this no longer count.
    pub lockout_duration: Duration,  // How long a locked credential stays locked.
    pub session_timeout: Duration,   // Idle time before a session expires.
    pub two_factor_timeout: Duration,// How long a two-factor verification stays fresh.
    pub issuer: String,              // Embedded in otpauth provisioning URIs.
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        SecurityPolicy {
            max_attempts: 5,
            attempts_window: Duration::minutes(15),
            lockout_duration: Duration::minutes(30),
            session_timeout: Duration::minutes(30),
            two_factor_timeout: Duration::minutes(30),
            issuer: String::from("Warden"),
        }
    }
}

impl From<&Configuration> for SecurityPolicy {
    fn from(config: &Configuration) -> Self {
        SecurityPolicy {
            max_attempts: config.max_attempts,
            attempts_window: Duration::seconds(config.attempts_window_seconds as i64),
            lockout_duration: Duration::seconds(config.lockout_seconds as i64),
            session_timeout: Duration::seconds(config.session_timeout_seconds as i64),
            two_factor_timeout: Duration::seconds(config.two_factor_timeout_seconds as i64),
            issuer: config.issuer.clone(),
        }
    }
}
