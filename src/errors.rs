use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sqlx::{migrate::MigrateError, Error as SqlxError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Tenant not found")]
    TenantNotFound,

    #[error("Item not found")]
    ItemNotFound,

    #[error("A tenant with slug '{0}' already exists")]
    DuplicateTenant(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    InternalServerError,

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Migration error: {0}")]
    MigrateError(#[from] MigrateError),

    #[error("Password hashing error: {0}")]
    PasswordError(String),

    #[error("Token error: {0}")]
    TokenError(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateTenant(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::TenantNotFound => StatusCode::NOT_FOUND,
            AppError::ItemNotFound => StatusCode::NOT_FOUND,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InternalServerError
            | AppError::DatabaseError(_)
            | AppError::MigrateError(_)
            | AppError::PasswordError(_)
            | AppError::TokenError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // server-side details stay in the log
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            AppError::InternalServerError.to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn client_errors_carry_their_message() {
        let err = AppError::InvalidInput("amount must be an integer".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(err).await,
            json!({ "error": "amount must be an integer" })
        );

        let err = AppError::DuplicateTenant("my-shop".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(err).await["error"],
            "A tenant with slug 'my-shop' already exists"
        );
    }

    #[actix_web::test]
    async fn server_errors_do_not_leak_details() {
        let err = AppError::DatabaseError(SqlxError::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(err).await, json!({ "error": "Internal server error" }));

        let err = AppError::PasswordError("salt too short".into());
        assert_eq!(body_of(err).await["error"], "Internal server error");
    }

    #[test]
    fn not_found_kinds_map_to_404() {
        assert_eq!(AppError::TenantNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ItemNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn startup_errors_convert_to_io_errors() {
        let err: std::io::Error = AppError::ConfigError("JWT_SECRET must be set".into()).into();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
        assert_eq!(err.to_string(), "Configuration error: JWT_SECRET must be set");
    }
}
