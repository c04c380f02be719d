use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::models::{
    other_admission::OtherAdmissionError, record::RecordError, task::TaskError, user::UserError,
};
use sea_orm::DbErr;
use services::services::{auth::AuthError, distributor::DistributorError, funnel::FunnelError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    OtherAdmission(#[from] OtherAdmissionError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Distributor(#[from] DistributorError),
    #[error(transparent)]
    Funnel(#[from] FunnelError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::User(UserError::UserNotFound) => StatusCode::NOT_FOUND,
            ApiError::User(UserError::UsernameTaken) => StatusCode::CONFLICT,
            ApiError::User(UserError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Record(RecordError::RecordNotFound) => StatusCode::NOT_FOUND,
            ApiError::Record(RecordError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Task(TaskError::TaskNotFound) => StatusCode::NOT_FOUND,
            ApiError::Task(TaskError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::OtherAdmission(OtherAdmissionError::AdmissionNotFound) => {
                StatusCode::NOT_FOUND
            }
            ApiError::OtherAdmission(OtherAdmissionError::Database(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Auth(AuthError::InvalidToken) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::TokenCreation) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(AuthError::HashingFailed) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Distributor(DistributorError::NoCallersAvailable) => StatusCode::BAD_REQUEST,
            ApiError::Distributor(DistributorError::Database(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Funnel(FunnelError::RecordNotFound) => StatusCode::NOT_FOUND,
            ApiError::Funnel(FunnelError::AdmissionNotFound) => StatusCode::NOT_FOUND,
            ApiError::Funnel(FunnelError::InvalidDate(_)) => StatusCode::BAD_REQUEST,
            ApiError::Funnel(FunnelError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            // Internal detail stays out of the response body.
            let body: ApiResponse<()> = ApiResponse::error("Internal server error");
            return (status, Json(body)).into_response();
        }
        let body: ApiResponse<()> = ApiResponse::error(&self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_400() {
        assert_eq!(
            ApiError::BadRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Funnel(FunnelError::InvalidDate("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Distributor(DistributorError::NoCallersAvailable).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_models_map_to_404() {
        assert_eq!(
            ApiError::Record(RecordError::RecordNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Funnel(FunnelError::AdmissionNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Task(TaskError::TaskNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn auth_failures_map_to_401_and_conflicts_to_409() {
        assert_eq!(
            ApiError::Auth(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::User(UserError::UsernameTaken).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn database_errors_map_to_500() {
        assert_eq!(
            ApiError::Database(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
