use serde_json::json;
use tonic::{Request, Response, Status};
use crate::{db, grpc::api, model::{credential::{self, Credential}, events::CredentialCreated}, utils::{self, context::ServiceContext, errors::WardenError, kafka::prelude::*}};


pub async fn create_credential(ctx: &ServiceContext, request: Request<api::CreateCredentialRequest>)
    -> Result<Response<api::CreateCredentialResponse>, Status> {

    let request = request.into_inner();
    let email = credential::normalise_email(&request.email);

    if email.is_empty() || request.password.is_empty() {
        return Err(Status::invalid_argument("An email address and password are required"))
    }

    // Hash the password with a blocking worker - never on the event loop.
    let plain_text_password = request.password.clone();
    let phc = tokio::task::spawn_blocking(move || credential::hash_password(&plain_text_password))
        .await
        .map_err(WardenError::from)??;

    let credential = Credential {
        credential_id: utils::generate_id(),
        email,
        phc,
        active: true,
        created_on: bson::DateTime::from_chrono(ctx.now()),
    };

    db::credential::insert(&credential, ctx.db()).await?;

    ctx.send(TOPIC_CREDENTIAL_CREATED,
        json!(CredentialCreated{ credential_id: credential.credential_id.clone() })).await?;

    Ok(Response::new(api::CreateCredentialResponse { credential_id: credential.credential_id }))
}
