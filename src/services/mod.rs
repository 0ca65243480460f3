mod change_password;
mod check_access;
mod confirm_two_factor;
mod create_credential;
mod disable_two_factor;
mod get_recovery_codes;
mod login;
mod logout;
mod logout_everywhere;
mod regenerate_recovery_codes;
mod reset_time;
mod set_time;
mod setup_two_factor;
mod verify_two_factor;

use std::sync::Arc;
use tracing::instrument;
use crate::model::credential;
use crate::utils::errors::WardenError;
use crate::utils::context::ServiceContext;
use crate::grpc::{api, common, internal};
use crate::grpc::api::warden_server::Warden;
use crate::grpc::internal::internal_server::Internal;
use tonic::{Request, Response, Status};

///
/// Implemention for all the gRPC service endpoints defined in the .proto file.
///
/// Requests are skipped from the instrumented spans - they carry passwords
/// and one-time codes.
///
#[tonic::async_trait]
impl Warden for Arc<ServiceContext> {

    #[instrument(skip(self, request))]
    async fn create_credential(&self, request: Request<api::CreateCredentialRequest>) -> Result<Response<api::CreateCredentialResponse>, Status> {
        create_credential::create_credential(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn login(&self, request: Request<api::LoginRequest>) -> Result<Response<api::LoginResponse>, Status> {
        login::login(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn change_password(&self, request: Request<api::ChangePasswordRequest>) -> Result<Response<common::Empty>, Status> {
        change_password::change_password(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn setup_two_factor(&self, request: Request<api::SetupTwoFactorRequest>) -> Result<Response<api::SetupTwoFactorResponse>, Status> {
        setup_two_factor::setup_two_factor(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn confirm_two_factor(&self, request: Request<api::ConfirmTwoFactorRequest>) -> Result<Response<api::ConfirmTwoFactorResponse>, Status> {
        confirm_two_factor::confirm_two_factor(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn verify_two_factor(&self, request: Request<api::VerifyTwoFactorRequest>) -> Result<Response<api::VerifyTwoFactorResponse>, Status> {
        verify_two_factor::verify_two_factor(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn disable_two_factor(&self, request: Request<api::DisableTwoFactorRequest>) -> Result<Response<common::Empty>, Status> {
        disable_two_factor::disable_two_factor(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn get_recovery_codes(&self, request: Request<api::GetRecoveryCodesRequest>) -> Result<Response<api::GetRecoveryCodesResponse>, Status> {
        get_recovery_codes::get_recovery_codes(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn regenerate_recovery_codes(&self, request: Request<api::RegenerateRecoveryCodesRequest>) -> Result<Response<api::RegenerateRecoveryCodesResponse>, Status> {
        regenerate_recovery_codes::regenerate_recovery_codes(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn check_access(&self, request: Request<api::CheckAccessRequest>) -> Result<Response<api::CheckAccessResponse>, Status> {
        check_access::check_access(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn logout(&self, request: Request<api::LogoutRequest>) -> Result<Response<common::Empty>, Status> {
        logout::logout(self, request).await
    }

    #[instrument(skip(self, request))]
    async fn logout_everywhere(&self, request: Request<api::LogoutEverywhereRequest>) -> Result<Response<common::Empty>, Status> {
        logout_everywhere::logout_everywhere(self, request).await
    }
}

#[tonic::async_trait]
impl Internal for Arc<ServiceContext> {
    async fn ping(&self, _request: Request<common::Empty>) -> Result<Response<common::Empty>, Status> {
        return Ok(Response::new(common::Empty::default()))
    }

    async fn set_time(&self, request: Request<internal::NewTime>) -> Result<Response<common::Empty>, Status> {
        set_time::set_time(self, request).await
    }

    async fn reset_time(&self, request: Request<common::Empty>) -> Result<Response<common::Empty>, Status> {
        reset_time::reset_time(self, request).await
    }
}

///
/// Validate a plain text password against a stored PHC hash. This is a highly CPU-bound
/// activity and is performed on the blocking worker thread pool, not the main event loop.
///
pub(crate) async fn verify_password_blocking(phc: String, plain_text_password: String) -> Result<bool, WardenError> {
    tokio::task::spawn_blocking(move || credential::verify_password(&plain_text_password, &phc))
        .await
        .map_err(WardenError::from)?
}
