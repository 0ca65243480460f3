use serde_json::json;
use tonic::{Request, Response, Status};
use crate::{db, grpc::api, model::{credential, events::AccountLocked}, utils::{context::ServiceContext, errors::ErrorCode, kafka::prelude::*}};


///
/// Authenticate a credential and mint a session.
///
/// The lockout check runs before any hashing work - a locked credential is
/// rejected immediately, which both saves the hash cost and stops the
/// response time leaking whether the password would have matched.
///
pub async fn login(ctx: &ServiceContext, request: Request<api::LoginRequest>)
    -> Result<Response<api::LoginResponse>, Status> {

    let request = request.into_inner();
    let email = credential::normalise_email(&request.email);

    // An unknown or deactivated credential gets the same generic rejection as
    // a bad password - nothing here confirms an email is registered.
    let credential = match db::credential::find_by_email(&email, ctx.db()).await? {
        Some(credential) if credential.active => credential,
        _ => return Err(Status::from(ErrorCode::InvalidCredentials
            .with_msg("The email or password is incorrect"))),
    };

    let state = db::lockout::check_locked(ctx, &credential.credential_id).await?;
    if state.locked {
        return Err(Status::from(ErrorCode::AccountLocked
            .with_msg(&format!("Too many failed attempts, try again in {} minutes", state.minutes_remaining))))
    }

    let valid = super::verify_password_blocking(credential.phc.clone(), request.password).await?;

    if !valid {
        let state = db::lockout::record_failure(ctx, &credential.credential_id).await?;

        if state.locked {
            tracing::warn!("Credential {} exceeded the failed-attempt threshold and is locked out", credential.credential_id);

            ctx.send(TOPIC_ACCOUNT_LOCKED, json!(AccountLocked{
                credential_id: credential.credential_id.clone(),
                minutes_remaining: state.minutes_remaining })).await?;

            return Err(Status::from(ErrorCode::AccountLocked
                .with_msg(&format!("Too many failed attempts, try again in {} minutes", state.minutes_remaining))))
        }

        return Err(Status::from(ErrorCode::InvalidCredentials
            .with_msg(&format!("The email or password is incorrect, {} attempts remaining", state.attempts_remaining))))
    }

    // Success clears the failure window entirely.
    db::lockout::record_success(ctx, &credential.credential_id).await?;

    let session = db::session::create(ctx, &credential.credential_id).await?;

    // The caller must follow up with VerifyTwoFactor when an enrolment is confirmed.
    let requires_two_factor = db::two_factor::load(&credential.credential_id, ctx.db()).await?
        .map(|enrolment| enrolment.confirmed())
        .unwrap_or(false);

    Ok(Response::new(api::LoginResponse { token: session.token, requires_two_factor }))
}
