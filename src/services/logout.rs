use tonic::{Request, Response, Status};
use crate::{db, grpc::{api, common}, utils::context::ServiceContext};


///
/// Revoke the session. Succeeds even for an unknown or expired token -
/// logging out twice is not an error.
///
pub async fn logout(ctx: &ServiceContext, request: Request<api::LogoutRequest>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    db::session::revoke(&request.token, ctx.db()).await?;

    Ok(Response::new(common::Empty{}))
}
