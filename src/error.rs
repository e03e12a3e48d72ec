//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::{header, HeaderValue, StatusCode},
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    Unauthorized,

    // Resource errors
    NotFound(String),
    AlreadyExists(String),

    // Validation errors
    ValidationError(String),

    // Database errors
    DatabaseError(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::TokenInvalid
            | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicate registration is reported as a plain bad request,
            // matching the contract the frontend already depends on.
            AppError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::InvalidCredentials => "Incorrect username or password",
            AppError::TokenExpired => "Token has expired",
            AppError::TokenInvalid => "Invalid token",
            AppError::Unauthorized => "Authentication required",
            AppError::NotFound(msg) => msg.as_str(),
            AppError::AlreadyExists(msg) => msg.as_str(),
            AppError::ValidationError(msg) => msg.as_str(),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error occurred"
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error"
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        let mut response = (status, body).into_response();

        // 401s advertise the expected scheme, as the OAuth2 password flow does
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::TokenInvalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::NotFound("Detection rule not found".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationError("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DatabaseError("down".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_registration_is_bad_request() {
        let err = AppError::AlreadyExists("Username or email already registered".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unauthorized_advertises_bearer_scheme() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );

        let response = AppError::TokenExpired.into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );

        // non-401 responses carry no challenge
        let response = AppError::NotFound("Detection rule not found".to_string()).into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_expired_jwt_maps_to_token_expired() {
        let err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        assert!(matches!(AppError::from(err), AppError::TokenExpired));

        let err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::InvalidSignature,
        );
        assert!(matches!(AppError::from(err), AppError::TokenInvalid));
    }
}
