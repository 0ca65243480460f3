use tonic::{Request, Response, Status};
use crate::{db, grpc::api, utils::{context::ServiceContext, errors::ErrorCode}};


///
/// The per-request guard every protected endpoint calls before its handler
/// logic runs.
///
/// Touching the session enforces (and lazily reaps) the idle timeout; when
/// the route demands two-factor, the session's own verification timestamp
/// must also still be fresh - the outer session being alive is not enough.
///
pub async fn check_access(ctx: &ServiceContext, request: Request<api::CheckAccessRequest>)
    -> Result<Response<api::CheckAccessResponse>, Status> {

    let request = request.into_inner();
    let session = db::session::touch(ctx, &request.token).await?;

    if request.require_two_factor && !session.two_factor_fresh(ctx.now(), ctx.policy()) {
        return Err(Status::from(ErrorCode::TwoFactorRequired
            .with_msg("A fresh two-factor verification is required for this operation")))
    }

    Ok(Response::new(api::CheckAccessResponse { credential_id: session.credential_id }))
}
