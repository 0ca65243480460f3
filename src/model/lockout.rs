use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use crate::model::policy::SecurityPolicy;

///
/// The failed-login window for one credential.
///
/// failure_count only reflects attempts inside the sliding attempts-window -
/// the window is anchored at the oldest counted failure and re-anchored (count
/// restarting at 1) once that failure ages out. locked_until is set exactly
/// once when the count reaches the policy maximum; a successful
/// authentication deletes the whole document.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Lockout {
    pub credential_id: String,
    pub failure_count: u32,
    pub first_failure: bson::DateTime,
    pub locked_until: Option<bson::DateTime>,
}

///
/// The caller-facing outcome of a lockout check or a recorded failure.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LockState {
    pub locked: bool,
    pub minutes_remaining: i64,
    pub attempts_remaining: u32,
}

impl LockState {
    pub fn unlocked(attempts_remaining: u32) -> Self {
        LockState { locked: false, minutes_remaining: 0, attempts_remaining }
    }

    pub fn locked(remaining: Duration) -> Self {
        LockState { locked: true, minutes_remaining: minutes_remaining(remaining), attempts_remaining: 0 }
    }
}

impl Lockout {
    ///
    /// How much lockout is left at `now` - None when not (or no longer) locked.
    ///
    pub fn lock_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.locked_until.and_then(|until| {
            let until: DateTime<Utc> = until.into();
            match until > now {
                true  => Some(until - now),
                false => None,
            }
        })
    }

    ///
    /// True when the oldest counted failure has aged out of the sliding
    /// window, so the next failure starts a fresh count.
    ///
    pub fn window_stale(&self, now: DateTime<Utc>, policy: &SecurityPolicy) -> bool {
        let first_failure: DateTime<Utc> = self.first_failure.into();
        now - first_failure > policy.attempts_window
    }
}

pub fn should_lock(failure_count: u32, policy: &SecurityPolicy) -> bool {
    failure_count >= policy.max_attempts
}

///
/// Whole minutes left, rounded up - "try again in 30 minutes" never says 0
/// while a lock is still active.
///
pub fn minutes_remaining(remaining: Duration) -> i64 {
    (remaining.num_seconds() + 59) / 60
}
