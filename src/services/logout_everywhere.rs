use serde_json::json;
use tonic::{Request, Response, Status};
use crate::{db, grpc::{api, common}, model::events::SessionsRevoked, utils::{context::ServiceContext, kafka::prelude::*}};


///
/// Revoke every session the credential owns, including the calling one.
///
pub async fn logout_everywhere(ctx: &ServiceContext, request: Request<api::LogoutEverywhereRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    let revoked = db::session::revoke_all(&session.credential_id, ctx.db()).await?;
    tracing::info!("Revoked {} session(s) for credential {}", revoked, session.credential_id);

    ctx.send(TOPIC_SESSIONS_REVOKED,
        json!(SessionsRevoked{ credential_id: session.credential_id.clone(), revoked })).await?;

    Ok(Response::new(common::Empty{}))
}
