use tonic::{Request, Response, Status};
use crate::{db, grpc::api, model::{otp, recovery, two_factor::TwoFactor}, utils::{context::ServiceContext, errors::WardenError}};


///
/// Begin two-factor enrolment for the session's credential.
///
/// A fresh secret and recovery set replace any earlier *pending* enrolment;
/// a confirmed enrolment must be disabled first. The plaintext secret and
/// codes are returned to the caller exactly once - only encrypted blobs are
/// persisted.
///
pub async fn setup_two_factor(ctx: &ServiceContext, request: Request<api::SetupTwoFactorRequest>)
    -> Result<Response<api::SetupTwoFactorResponse>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let secret = otp::generate_secret();
    let recovery_codes = recovery::generate_set();

    let encrypted_secret = ctx.cipher().encrypt(secret.as_bytes())?;
    let encrypted_codes = recovery_codes.iter()
        .map(|code| ctx.cipher().encrypt(code.as_bytes()))
        .collect::<Result<Vec<String>, WardenError>>()?;

    let enrolment = TwoFactor::pending(&session.credential_id, encrypted_secret, encrypted_codes);
    db::two_factor::start_enrolment(ctx, &enrolment).await?;

    // The account label authenticator apps display is the email address.
    let credential = db::credential::load(&session.credential_id, ctx.db()).await?;
    let otpauth_uri = otp::provisioning_uri(&ctx.policy().issuer, &credential.email, &secret);

    Ok(Response::new(api::SetupTwoFactorResponse { secret, otpauth_uri, recovery_codes }))
}
