use chrono::{DateTime, Utc};
use crate::grpc::{common, internal};
use crate::utils::context::ServiceContext;
use tonic::{Request, Response, Status};


pub async fn set_time(ctx: &ServiceContext, request: Request<internal::NewTime>)
    -> Result<Response<common::Empty>, Status> {

    let request = request.into_inner();
    let parsed = match DateTime::parse_from_rfc3339(&request.new_time) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => return Err(Status::invalid_argument(format!("Could not parse datetime: {}", err))),
    };

    ctx.set_now(Some(parsed));
    tracing::info!("Service clock fixed to {:?}", parsed);
    Ok(Response::new(common::Empty::default()))
}
