use tonic::{Request, Response, Status};
use crate::{db, grpc::api, model::{otp, recovery, two_factor::TwoFactor}, utils::{context::ServiceContext, errors::{ErrorCode, WardenError}}};


///
/// Prove a TOTP (or recovery) code against the credential's confirmed
/// enrolment and mark the session as two-factor verified.
///
pub async fn verify_two_factor(ctx: &ServiceContext, request: Request<api::VerifyTwoFactorRequest>)
    -> Result<Response<api::VerifyTwoFactorResponse>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let enrolment = match db::two_factor::load(&session.credential_id, ctx.db()).await? {
        Some(enrolment) if enrolment.confirmed() => enrolment,
        _ => return Err(Status::from(ErrorCode::TwoFactorNotEnabled
            .with_msg("Two-factor authentication is not enabled for this credential"))),
    };

    if !verify_enrolment_code(ctx, &enrolment, &request.code).await? {
        return Err(Status::from(ErrorCode::InvalidTwoFactorCode
            .with_msg("The code does not match, check the authenticator app and try again")))
    }

    let verified_at = db::session::mark_two_factor_verified(ctx, &session.token).await?;

    Ok(Response::new(api::VerifyTwoFactorResponse { verified_at: verified_at.to_rfc3339() }))
}

///
/// Check a submitted code against the enrolment: unconsumed recovery codes
/// first (a match consumes that code for good), then the TOTP drift window.
///
pub async fn verify_enrolment_code(ctx: &ServiceContext, enrolment: &TwoFactor, code: &str)
    -> Result<bool, WardenError> {

    let submitted = recovery::normalise(code);

    for (index, recovery_code) in enrolment.recovery_codes.iter().enumerate() {
        if recovery_code.consumed {
            continue
        }

        let plain = ctx.cipher().decrypt_str(&recovery_code.code)?;

        if otp::constant_time_eq(&recovery::normalise(&plain), &submitted) {
            // Atomic check-and-mark - when two requests race on the same code
            // only one of them gets a true back.
            return db::two_factor::consume_code(ctx, &enrolment.credential_id, index).await
        }
    }

    let secret = ctx.cipher().decrypt_str(&enrolment.secret)?;
    let secret = otp::decode_base32(&secret)?;

    otp::verify_with_drift(&secret, code, ctx.now())
}
