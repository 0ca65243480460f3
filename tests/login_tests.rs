mod common;
use tonic::{Code, Request};
use warden::grpc::api;
use crate::common::{TestConfig, helper, start_warden};

const GOOD_PWD: &str = "W!bbl321";
const BAD_PWD:  &str = "Hello456!";


#[tokio::test]
async fn test_a_new_credential_can_login() {
    // Start the server if needed, and ensure this test has exclusive access.
    let mut ctx = start_warden(TestConfig::default()).await;
    helper::reset_time(&mut ctx).await;

    let email = helper::unique_email();
    let credential_id = helper::create_credential(&email, GOOD_PWD, &mut ctx).await;
    assert_ne!(credential_id.len(), 0);

    let response = helper::login_ok(&email, GOOD_PWD, &mut ctx).await;
    assert_ne!(response.token.len(), 0);
    assert_eq!(response.requires_two_factor, false);

    // An incorrect password gets the generic rejection.
    let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);
}


#[tokio::test]
async fn test_a_duplicate_email_is_rejected() {
    let mut ctx = start_warden(TestConfig::default()).await;
    helper::reset_time(&mut ctx).await;

    let email = helper::unique_email();
    helper::create_credential(&email, GOOD_PWD, &mut ctx).await;

    let status = ctx.client().create_credential(Request::new(api::CreateCredentialRequest {
            email: email.clone(),
            password: GOOD_PWD.to_string(),
        })).await.err().expect("duplicate create should fail");

    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(helper::error_code(&status), 2000 /* EmailAlreadyRegistered */);
}


#[tokio::test]
async fn test_an_unknown_email_gets_the_generic_rejection() {
    let mut ctx = start_warden(TestConfig::default()).await;
    helper::reset_time(&mut ctx).await;

    let status = helper::login_err(&helper::unique_email(), GOOD_PWD, &mut ctx).await;
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);
}


#[tokio::test]
async fn test_five_failures_inside_the_window_lock_the_account() {
    let mut ctx = start_warden(TestConfig::default()).await;

    // Failures at 09:30, 09:31, 09:32, 09:33 then 09:44 - all inside the
    // 15-minute sliding window anchored at the first failure.
    helper::set_time("2021-08-23T09:30:00Z", &mut ctx).await;

    let email = helper::unique_email();
    helper::create_credential(&email, GOOD_PWD, &mut ctx).await;

    for minute in &["09:30", "09:31", "09:32", "09:33"] {
        helper::set_time(&format!("2021-08-23T{}:00Z", minute), &mut ctx).await;
        let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
        assert_eq!(status.code(), Code::Unauthenticated);
        assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);
    }

    // The fifth failure tips it over the threshold.
    helper::set_time("2021-08-23T09:44:00Z", &mut ctx).await;
    let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
    assert_eq!(status.code(), Code::ResourceExhausted);
    assert_eq!(helper::error_code(&status), 2003 /* AccountLocked */);

    // Even the correct password is rejected while the lockout is active - and
    // the rejection happens before any hash work or counter increment.
    let status = helper::login_err(&email, GOOD_PWD, &mut ctx).await;
    assert_eq!(status.code(), Code::ResourceExhausted);
    assert_eq!(helper::error_code(&status), 2003 /* AccountLocked */);

    // Still locked one minute before the 30-minute lockout expires...
    helper::set_time("2021-08-23T10:13:00Z", &mut ctx).await;
    let status = helper::login_err(&email, GOOD_PWD, &mut ctx).await;
    assert_eq!(helper::error_code(&status), 2003 /* AccountLocked */);

    // ...and usable again once it has.
    helper::set_time("2021-08-23T10:15:00Z", &mut ctx).await;
    let response = helper::login_ok(&email, GOOD_PWD, &mut ctx).await;
    assert_ne!(response.token.len(), 0);
}


#[tokio::test]
async fn test_failures_spread_wider_than_the_window_do_not_lock() {
    let mut ctx = start_warden(TestConfig::default()).await;

    let email = helper::unique_email();
    helper::set_time("2021-08-23T09:00:00Z", &mut ctx).await;
    helper::create_credential(&email, GOOD_PWD, &mut ctx).await;

    // Five failures across 16 minutes - by the fifth, the anchor failure has
    // aged out of the window so the count restarts rather than locking.
    for minute in &["09:00", "09:04", "09:08", "09:12"] {
        helper::set_time(&format!("2021-08-23T{}:00Z", minute), &mut ctx).await;
        let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
        assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);
    }

    helper::set_time("2021-08-23T09:16:00Z", &mut ctx).await;
    let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
    assert_eq!(status.code(), Code::Unauthenticated);
    assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);

    // Another failure in the re-anchored window makes the count two - so
    // three attempts left, proving the count restarted at one above.
    let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
    assert!(status.message().contains("3 attempts remaining"), "was: {}", status.message());
}


#[tokio::test]
async fn test_a_successful_login_resets_the_window() {
    let mut ctx = start_warden(TestConfig::default()).await;

    let email = helper::unique_email();
    helper::set_time("2021-08-23T09:30:00Z", &mut ctx).await;
    helper::create_credential(&email, GOOD_PWD, &mut ctx).await;

    // Four failures - one shy of the threshold.
    for _ in 0..4 {
        let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
        assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);
    }

    // A success wipes the slate clean.
    helper::login_ok(&email, GOOD_PWD, &mut ctx).await;

    // The next failure starts a fresh count of 1.
    let status = helper::login_err(&email, BAD_PWD, &mut ctx).await;
    assert_eq!(helper::error_code(&status), 2002 /* InvalidCredentials */);
    assert!(status.message().contains("4 attempts remaining"), "was: {}", status.message());
}
