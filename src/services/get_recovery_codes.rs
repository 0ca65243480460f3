use tonic::{Request, Response, Status};
use crate::{db, grpc::api, utils::{context::ServiceContext, errors::{ErrorCode, WardenError}}};


///
/// Return the recovery codes that are still unconsumed, and how many remain.
///
pub async fn get_recovery_codes(ctx: &ServiceContext, request: Request<api::GetRecoveryCodesRequest>)
    -> Result<Response<api::GetRecoveryCodesResponse>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let enrolment = match db::two_factor::load(&session.credential_id, ctx.db()).await? {
        Some(enrolment) if enrolment.confirmed() => enrolment,
        _ => return Err(Status::from(ErrorCode::TwoFactorNotEnabled
            .with_msg("Two-factor authentication is not enabled for this credential"))),
    };

    let codes = enrolment.recovery_codes.iter()
        .filter(|code| !code.consumed)
        .map(|code| ctx.cipher().decrypt_str(&code.code))
        .collect::<Result<Vec<String>, WardenError>>()?;

    let remaining = enrolment.remaining_codes();

    Ok(Response::new(api::GetRecoveryCodesResponse { codes, remaining }))
}
