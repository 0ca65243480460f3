use serde_json::json;
use tonic::{Request, Response, Status};
use crate::{db, grpc::{api, common}, model::{credential, events::SessionsRevoked}, utils::{context::ServiceContext, errors::{ErrorCode, WardenError}, kafka::prelude::*}};


///
/// Replace the password hash and revoke every session for the credential -
/// anything holding an old token (this session included) must sign in again.
///
pub async fn change_password(ctx: &ServiceContext, request: Request<api::ChangePasswordRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let stored = db::credential::load(&session.credential_id, ctx.db()).await?;
    let valid = super::verify_password_blocking(stored.phc.clone(), request.current_password).await?;
    if !valid {
        return Err(Status::from(ErrorCode::InvalidCredentials.with_msg("The current password is incorrect")))
    }

    if request.new_password.is_empty() {
        return Err(Status::invalid_argument("A new password is required"))
    }

    // Hash the replacement on the blocking pool.
    let new_password = request.new_password;
    let phc = tokio::task::spawn_blocking(move || credential::hash_password(&new_password))
        .await
        .map_err(WardenError::from)??;

    db::credential::update_phc(ctx, &session.credential_id, &phc).await?;

    let revoked = db::session::revoke_all(&session.credential_id, ctx.db()).await?;
    tracing::info!("Password changed for credential {}, {} session(s) revoked", session.credential_id, revoked);

    ctx.send(TOPIC_SESSIONS_REVOKED,
        json!(SessionsRevoked{ credential_id: session.credential_id.clone(), revoked })).await?;

    Ok(Response::new(common::Empty{}))
}
