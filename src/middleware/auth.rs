//! Authentication middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::handlers::auth::Claims;
use crate::models::User;
use crate::{AppError, AppState};

/// Authenticated principal resolved from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Middleware: require a valid user JWT on every route behind it.
///
/// The token subject is a username; resolving it back to a user row means a
/// token for a since-removed account stops working even before it expires.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&req)?;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    let user = User::find_by_username(&state.pool, &token_data.claims.sub)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    req.extensions_mut().insert(CurrentUser::from(&user));

    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Result<String, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized);
    }

    Ok(auth_header[7..].to_string())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: Option<&str>) -> Request {
        let builder = axum::http::Request::builder().uri("/detection-rules");
        let builder = match value {
            Some(v) => builder.header(AUTHORIZATION, v),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let req = request_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_rejected() {
        let req = request_with_auth(None);
        assert!(matches!(
            extract_bearer_token(&req),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let req = request_with_auth(Some("Basic dXNlcjpwdw=="));
        assert!(matches!(
            extract_bearer_token(&req),
            Err(AppError::Unauthorized)
        ));
    }
}
