use super::TestContext;
use chrono::{DateTime, Utc};
use tonic::{Request, Status};
use warden::model::otp;
use warden::grpc::{api, common, internal};

///
/// Every test registers its own credential so tests cannot trample each other's
/// lockout windows or enrolments.
///
pub fn unique_email() -> String {
    format!("{}@example.com", uuid::Uuid::new_v4().to_hyphenated())
}

///
/// The stable numeric error code the service puts in the Status details.
///
pub fn error_code(status: &Status) -> u32 {
    String::from_utf8_lossy(status.details())
        .parse()
        .expect("Status had no numeric error code in its details")
}

///
/// Fix the service clock - every lockout, session and TOTP window check will
/// see this instant until the clock is moved or reset.
///
pub async fn set_time(new_time: &str, ctx: &mut TestContext) {
    ctx.internal()
        .set_time(Request::new(internal::NewTime { new_time: new_time.to_string() }))
        .await
        .expect("set_time failed");
}

pub async fn reset_time(ctx: &mut TestContext) {
    ctx.internal()
        .reset_time(Request::new(common::Empty::default()))
        .await
        .expect("reset_time failed");
}

pub async fn create_credential(email: &str, password: &str, ctx: &mut TestContext) -> String {
    ctx.client()
        .create_credential(Request::new(api::CreateCredentialRequest {
            email: email.to_string(),
            password: password.to_string(),
        }))
        .await
        .expect("create_credential failed")
        .into_inner()
        .credential_id
}

pub async fn login_ok(email: &str, password: &str, ctx: &mut TestContext) -> api::LoginResponse {
    ctx.client()
        .login(Request::new(api::LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }))
        .await
        .expect("expected the login to succeed")
        .into_inner()
}

pub async fn login_err(email: &str, password: &str, ctx: &mut TestContext) -> Status {
    ctx.client()
        .login(Request::new(api::LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }))
        .await
        .err()
        .expect("expected the login to fail")
}

///
/// Derive the authenticator-app code for a base32 secret at a fixed instant,
/// optionally drifted by whole time steps.
///
pub fn totp_code(secret: &str, at_rfc3339: &str, drift_steps: i64) -> String {
    let at = DateTime::parse_from_rfc3339(at_rfc3339)
        .expect("bad test timestamp")
        .with_timezone(&Utc);

    let secret = otp::decode_base32(secret).expect("bad test secret");
    let step = (otp::time_step(at) as i64 + drift_steps) as u64;

    otp::derive_code(&secret, step).expect("code derivation failed")
}

///
/// Enrol and confirm two-factor for the session, with the clock fixed at
/// `at_rfc3339`. Returns the setup response (plaintext secret + recovery codes).
///
pub async fn enable_two_factor(token: &str, at_rfc3339: &str, ctx: &mut TestContext) -> api::SetupTwoFactorResponse {
    set_time(at_rfc3339, ctx).await;

    let setup = ctx.client()
        .setup_two_factor(Request::new(api::SetupTwoFactorRequest { token: token.to_string() }))
        .await
        .expect("setup_two_factor failed")
        .into_inner();

    let code = totp_code(&setup.secret, at_rfc3339, 0);

    ctx.client()
        .confirm_two_factor(Request::new(api::ConfirmTwoFactorRequest {
            token: token.to_string(),
            code,
        }))
        .await
        .expect("confirm_two_factor failed");

    setup
}
