use serde_json::json;
use tonic::{Request, Response, Status};
use super::verify_two_factor::verify_enrolment_code;
use crate::{db, grpc::{api, common}, model::events::TwoFactorDisabled, utils::{context::ServiceContext, errors::ErrorCode, kafka::prelude::*}};


///
/// Discard the two-factor secret and every recovery code.
///
/// Re-authentication by password is mandatory; when a code accompanies the
/// request it must verify too. The removal itself is idempotent.
///
pub async fn disable_two_factor(ctx: &ServiceContext, request: Request<api::DisableTwoFactorRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let credential = db::credential::load(&session.credential_id, ctx.db()).await?;
    let valid = super::verify_password_blocking(credential.phc.clone(), request.password).await?;
    if !valid {
        return Err(Status::from(ErrorCode::InvalidCredentials.with_msg("The password is incorrect")))
    }

    if let Some(enrolment) = db::two_factor::load(&session.credential_id, ctx.db()).await? {
        if let Some(code) = &request.code {
            if !verify_enrolment_code(ctx, &enrolment, code).await? {
                return Err(Status::from(ErrorCode::InvalidTwoFactorCode
                    .with_msg("The code does not match, check the authenticator app and try again")))
            }
        }

        db::two_factor::disable(ctx, &session.credential_id).await?;

        ctx.send(TOPIC_TWO_FACTOR_DISABLED,
            json!(TwoFactorDisabled{ credential_id: session.credential_id.clone() })).await?;
    }

    Ok(Response::new(common::Empty{}))
}
