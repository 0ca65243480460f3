use serde_json::json;
use tonic::{Request, Response, Status};
use crate::{db, grpc::api, model::{events::RecoveryCodesRegenerated, recovery, two_factor::RecoveryCode}, utils::{context::ServiceContext, errors::{ErrorCode, WardenError}, kafka::prelude::*}};


///
/// Issue a fresh recovery set, invalidating every previous code. The caller
/// must re-authenticate with their password.
///
pub async fn regenerate_recovery_codes(ctx: &ServiceContext, request: Request<api::RegenerateRecoveryCodesRequest>)
    -> Result<Response<api::RegenerateRecoveryCodesResponse>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let credential = db::credential::load(&session.credential_id, ctx.db()).await?;
    let valid = super::verify_password_blocking(credential.phc.clone(), request.password).await?;
    if !valid {
        return Err(Status::from(ErrorCode::InvalidCredentials.with_msg("The password is incorrect")))
    }

    let codes = recovery::generate_set();
    let encrypted = codes.iter()
        .map(|code| Ok(RecoveryCode { code: ctx.cipher().encrypt(code.as_bytes())?, consumed: false }))
        .collect::<Result<Vec<RecoveryCode>, WardenError>>()?;

    db::two_factor::replace_codes(ctx, &session.credential_id, &encrypted).await?;

    ctx.send(TOPIC_RECOVERY_CODES_REGENERATED,
        json!(RecoveryCodesRegenerated{ credential_id: session.credential_id.clone() })).await?;

    Ok(Response::new(api::RegenerateRecoveryCodesResponse { codes }))
}
