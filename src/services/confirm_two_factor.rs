use serde_json::json;
use tonic::{Request, Response, Status};
use crate::{db, grpc::api, model::{events::TwoFactorEnabled, otp}, utils::{context::ServiceContext, errors::{ErrorCode, WardenError}, kafka::prelude::*}};


///
/// Complete enrolment by proving possession of the pending secret.
///
/// A failed code leaves the pending state untouched and costs nothing from
/// the login lockout window - setup confirmation is not a credential
/// authentication event.
///
pub async fn confirm_two_factor(ctx: &ServiceContext, request: Request<api::ConfirmTwoFactorRequest>)
    -> Result<Response<api::ConfirmTwoFactorResponse>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let enrolment = match db::two_factor::load(&session.credential_id, ctx.db()).await? {
        Some(enrolment) if !enrolment.confirmed() => enrolment,
        _ => return Err(Status::from(ErrorCode::TwoFactorSetupExpired
            .with_msg("There is no two-factor setup in progress, start again"))),
    };

    let secret = ctx.cipher().decrypt_str(&enrolment.secret)?;
    let secret = otp::decode_base32(&secret)?;

    if !otp::verify_with_drift(&secret, &request.code, ctx.now())? {
        return Err(Status::from(ErrorCode::InvalidTwoFactorCode
            .with_msg("The code does not match, check the authenticator app and try again")))
    }

    // The confirmed_on guard loses gracefully if the enrolment was disabled
    // or re-confirmed underneath us.
    if !db::two_factor::confirm(ctx, &session.credential_id).await? {
        return Err(Status::from(ErrorCode::TwoFactorSetupExpired
            .with_msg("There is no two-factor setup in progress, start again")))
    }

    ctx.send(TOPIC_TWO_FACTOR_ENABLED,
        json!(TwoFactorEnabled{ credential_id: session.credential_id.clone() })).await?;

    // Hand the recovery codes back so the caller can re-display them.
    let recovery_codes = enrolment.recovery_codes.iter()
        .map(|code| ctx.cipher().decrypt_str(&code.code))
        .collect::<Result<Vec<String>, WardenError>>()?;

    Ok(Response::new(api::ConfirmTwoFactorResponse { recovery_codes }))
}
