use rand::Rng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::model::policy::SecurityPolicy;

const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 48;

///
/// One authenticated session, created at login.
///
/// last_activity only ever moves forward (touch refuses to run once the
/// session has expired). two_factor_verified_at is the single authoritative
/// record of a completed two-factor challenge for this session - "session
/// alive" and "two-factor freshly proven" run on separate timers.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    pub token: String,
    pub credential_id: String,
    pub created_on: bson::DateTime,
    pub last_activity: bson::DateTime,
    pub two_factor_verified_at: Option<bson::DateTime>,
}

impl Session {
    pub fn new(credential_id: &str, now: DateTime<Utc>) -> Self {
        Session {
            token: generate_token(),
            credential_id: credential_id.to_string(),
            created_on: bson::DateTime::from_chrono(now),
            last_activity: bson::DateTime::from_chrono(now),
            two_factor_verified_at: None,
        }
    }

    ///
    /// A session is usable only while now - last_activity < session_timeout.
    ///
    pub fn expired(&self, now: DateTime<Utc>, policy: &SecurityPolicy) -> bool {
        let last_activity: DateTime<Utc> = self.last_activity.into();
        now - last_activity >= policy.session_timeout
    }

    ///
    /// True while a two-factor verification on this session is recent enough
    /// to trust - the outer session may outlive this.
    ///
    pub fn two_factor_fresh(&self, now: DateTime<Utc>, policy: &SecurityPolicy) -> bool {
        match self.two_factor_verified_at {
            Some(verified_at) => {
                let verified_at: DateTime<Utc> = verified_at.into();
                now - verified_at < policy.two_factor_timeout
            },
            None => false,
        }
    }
}

pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_CHARSET.len());
            TOKEN_CHARSET[idx] as char
        })
        .collect()
}
