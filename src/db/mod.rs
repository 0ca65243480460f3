pub mod credential;
pub mod lockout;
pub mod mongo;
pub mod session;
pub mod two_factor;

pub mod prelude {
    // Collection names.
    pub const CREDENTIALS: &str = "Credentials";
    pub const TWO_FACTOR:  &str = "TwoFactor";
    pub const LOCKOUTS:    &str = "Lockouts";
    pub const SESSIONS:    &str = "Sessions";

    // Field names.
    pub const ACTIVE:                 &str = "active";
    pub const CONFIRMED_ON:           &str = "confirmed_on";
    pub const CONSUMED:               &str = "consumed";
    pub const CREDENTIAL_ID:          &str = "credential_id";
    pub const EMAIL:                  &str = "email";
    pub const FAILURE_COUNT:          &str = "failure_count";
    pub const FIRST_FAILURE:          &str = "first_failure";
    pub const LAST_ACTIVITY:          &str = "last_activity";
    pub const LOCKED_UNTIL:           &str = "locked_until";
    pub const PHC:                    &str = "phc";
    pub const RECOVERY_CODES:         &str = "recovery_codes";
    pub const SECRET:                 &str = "secret";
    pub const TOKEN:                  &str = "token";
    pub const TWO_FACTOR_VERIFIED_AT: &str = "two_factor_verified_at";
}
