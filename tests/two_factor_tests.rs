mod common;
use tonic::{Code, Request};
use warden::grpc::api;
use crate::common::{TestConfig, helper, start_warden};

const PWD: &str = "W!bbl321";
const T0: &str = "2021-08-23T09:30:00Z";

///
/// A 6-digit code guaranteed not to equal `real` - the odds of "000000" being
/// the live code are a million to one, but a deterministic test takes no odds.
///
fn wrong_code(real: &str) -> String {
    match real {
        "000000" => "000001".to_string(),
        _        => "000000".to_string(),
    }
}


#[tokio::test]
async fn test_the_full_enrolment_flow() {
    // Start the server if needed, and ensure this test has exclusive access.
    let mut ctx = start_warden(TestConfig::default()).await;
    helper::set_time(T0, &mut ctx).await;

    let email = helper::unique_email();
    helper::create_credential(&email, PWD, &mut ctx).await;
    let token = helper::login_ok(&email, PWD, &mut ctx).await.token;

    // Setup hands back the secret, a provisioning uri and eight recovery codes.
    let setup = ctx.client().setup_two_factor(Request::new(api::SetupTwoFactorRequest {
            token: token.clone(),
        })).await.unwrap().into_inner();

    assert_eq!(setup.secret.len(), 32);
    assert_eq!(setup.recovery_codes.len(), 8);
    assert_eq!(setup.otpauth_uri,
        format!("otpauth://totp/Warden:{}?secret={}&issuer=Warden", email, setup.secret));

    // A wrong code leaves the pending setup untouched.
    let real = helper::totp_code(&setup.secret, T0, 0);
    let status = ctx.client().confirm_two_factor(Request::new(api::ConfirmTwoFactorRequest {
            token: token.clone(),
            code: wrong_code(&real),
        })).await.err().expect("a wrong code must not confirm");
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(helper::error_code(&status), 2103 /* InvalidTwoFactorCode */);

    // The right code confirms and returns the same recovery set.
    let confirmed = ctx.client().confirm_two_factor(Request::new(api::ConfirmTwoFactorRequest {
            token: token.clone(),
            code: real,
        })).await.unwrap().into_inner();
    assert_eq!(confirmed.recovery_codes, setup.recovery_codes);

    // From here on a login demands the second factor.
    let login = helper::login_ok(&email, PWD, &mut ctx).await;
    assert_eq!(login.requires_two_factor, true);

    // Verify with a fresh code marks the session.
    let code = helper::totp_code(&setup.secret, T0, 0);
    let verified = ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
            token: login.token.clone(),
            code,
        })).await.unwrap().into_inner();
    assert_ne!(verified.verified_at.len(), 0);

    // And a second enrolment is refused while one is confirmed.
    let status = ctx.client().setup_two_factor(Request::new(api::SetupTwoFactorRequest {
            token: login.token,
        })).await.err().expect("setup over a confirmed enrolment must fail");
    assert_eq!(status.code(), Code::FailedPrecondition);
    assert_eq!(helper::error_code(&status), 2100 /* TwoFactorAlreadyEnabled */);
}


#[tokio::test]
async fn test_confirm_without_a_pending_setup() {
    let mut ctx = start_warden(TestConfig::default()).await;
    helper::set_time(T0, &mut ctx).await;

    let email = helper::unique_email();
    helper::create_credential(&email, PWD, &mut ctx).await;
    let token = helper::login_ok(&email, PWD, &mut ctx).await.token;

    let status = ctx.client().confirm_two_factor(Request::new(api::ConfirmTwoFactorRequest {
            token,
            code: "000000".to_string(),
        })).await.err().expect("confirm without setup must fail");

    assert_eq!(status.code(), Code::FailedPrecondition);
    assert_eq!(helper::error_code(&status), 2102 /* TwoFactorSetupExpired */);
}


#[tokio::test]
async fn test_codes_from_adjacent_time_steps_are_tolerated() {
    let mut ctx = start_warden(TestConfig::default()).await;

    let email = helper::unique_email();
    helper::set_time(T0, &mut ctx).await;
    helper::create_credential(&email, PWD, &mut ctx).await;
    let token = helper::login_ok(&email, PWD, &mut ctx).await.token;
    let setup = helper::enable_two_factor(&token, T0, &mut ctx).await;

    let session = helper::login_ok(&email, PWD, &mut ctx).await.token;

    // One step either side absorbs clock drift; two steps is too stale.
    for (drift, accepted) in &[(-1_i64, true), (0, true), (1, true), (-2, false), (2, false)] {
        let code = helper::totp_code(&setup.secret, T0, *drift);
        let result = ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
                token: session.clone(),
                code,
            })).await;

        match accepted {
            true  => { result.expect(&format!("drift {} should verify", drift)); },
            false => {
                let status = result.err().expect(&format!("drift {} should be rejected", drift));
                assert_eq!(helper::error_code(&status), 2103 /* InvalidTwoFactorCode */);
            },
        }
    }
}


#[tokio::test]
async fn test_a_recovery_code_verifies_exactly_once() {
    let mut ctx = start_warden(TestConfig::default()).await;

    let email = helper::unique_email();
    helper::set_time(T0, &mut ctx).await;
    helper::create_credential(&email, PWD, &mut ctx).await;
    let token = helper::login_ok(&email, PWD, &mut ctx).await.token;
    let setup = helper::enable_two_factor(&token, T0, &mut ctx).await;

    let session = helper::login_ok(&email, PWD, &mut ctx).await.token;

    // Recovery code #3 substitutes for a TOTP code...
    ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
            token: session.clone(),
            code: setup.recovery_codes[2].clone(),
        })).await.expect("an unconsumed recovery code should verify");

    // ...but only once.
    let status = ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
            token: session.clone(),
            code: setup.recovery_codes[2].clone(),
        })).await.err().expect("a consumed recovery code must not verify again");
    assert_eq!(helper::error_code(&status), 2103 /* InvalidTwoFactorCode */);

    // The other seven are unaffected.
    ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
            token: session.clone(),
            code: setup.recovery_codes[0].clone(),
        })).await.expect("the other codes should still verify");

    let codes = ctx.client().get_recovery_codes(Request::new(api::GetRecoveryCodesRequest {
            token: session,
        })).await.unwrap().into_inner();

    assert_eq!(codes.remaining, 6);
    assert!(!codes.codes.contains(&setup.recovery_codes[2]));
    assert!(!codes.codes.contains(&setup.recovery_codes[0]));
    assert!(codes.codes.contains(&setup.recovery_codes[1]));
}


#[tokio::test]
async fn test_regenerating_invalidates_the_old_set() {
    let mut ctx = start_warden(TestConfig::default()).await;

    let email = helper::unique_email();
    helper::set_time(T0, &mut ctx).await;
    helper::create_credential(&email, PWD, &mut ctx).await;
    let token = helper::login_ok(&email, PWD, &mut ctx).await.token;
    let setup = helper::enable_two_factor(&token, T0, &mut ctx).await;

    let session = helper::login_ok(&email, PWD, &mut ctx).await.token;

    // Regeneration demands the password again.
    let status = ctx.client().regenerate_recovery_codes(Request::new(api::RegenerateRecoveryCodesRequest {
            token: session.clone(),
            password: "Hello456!".to_string(),
        })).await.err().expect("regenerate with a bad password must fail");
    assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);

    let fresh = ctx.client().regenerate_recovery_codes(Request::new(api::RegenerateRecoveryCodesRequest {
            token: session.clone(),
            password: PWD.to_string(),
        })).await.unwrap().into_inner();
    assert_eq!(fresh.codes.len(), 8);

    // Old set dead, new set live.
    let status = ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
            token: session.clone(),
            code: setup.recovery_codes[0].clone(),
        })).await.err().expect("an invalidated code must not verify");
    assert_eq!(helper::error_code(&status), 2103 /* InvalidTwoFactorCode */);

    ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
            token: session,
            code: fresh.codes[0].clone(),
        })).await.expect("a code from the fresh set should verify");
}


#[tokio::test]
async fn test_disable_discards_the_secret_and_codes() {
    let mut ctx = start_warden(TestConfig::default()).await;

    let email = helper::unique_email();
    helper::set_time(T0, &mut ctx).await;
    helper::create_credential(&email, PWD, &mut ctx).await;
    let token = helper::login_ok(&email, PWD, &mut ctx).await.token;
    let setup = helper::enable_two_factor(&token, T0, &mut ctx).await;

    let session = helper::login_ok(&email, PWD, &mut ctx).await.token;

    // The password must re-verify before anything is discarded.
    let status = ctx.client().disable_two_factor(Request::new(api::DisableTwoFactorRequest {
            token: session.clone(),
            password: "Hello456!".to_string(),
            code: None,
        })).await.err().expect("disable with a bad password must fail");
    assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);

    ctx.client().disable_two_factor(Request::new(api::DisableTwoFactorRequest {
            token: session.clone(),
            password: PWD.to_string(),
            code: Some(helper::totp_code(&setup.secret, T0, 0)),
        })).await.expect("disable should succeed");

    // The credential is back to single-factor logins.
    let login = helper::login_ok(&email, PWD, &mut ctx).await;
    assert_eq!(login.requires_two_factor, false);

    // All recovery codes died with the secret.
    let status = ctx.client().verify_two_factor(Request::new(api::VerifyTwoFactorRequest {
            token: session.clone(),
            code: setup.recovery_codes[0].clone(),
        })).await.err().expect("verify after disable must fail");
    assert_eq!(status.code(), Code::FailedPrecondition);
    assert_eq!(helper::error_code(&status), 2101 /* TwoFactorNotEnabled */);

    // Disabling again is a no-op, not an error.
    ctx.client().disable_two_factor(Request::new(api::DisableTwoFactorRequest {
            token: session,
            password: PWD.to_string(),
            code: None,
        })).await.expect("disable is idempotent");
}
