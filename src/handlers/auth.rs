//! Authentication handlers

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{extract::State, Form, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{LoginForm, RegisterRequest, TokenResponse, User, UserResponse};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub exp: usize,  // Expiration timestamp
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<UserResponse>> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    // One combined check covers both unique columns, so the response never
    // reveals which of the two collided.
    if User::exists_by_username_or_email(&state.pool, &req.username, &req.email).await? {
        return Err(AppError::AlreadyExists(
            "Username or email already registered".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = User::create(&state.pool, &req.username, &req.email, password_hash).await?;

    tracing::info!("New user registered: {} ({})", user.username, user.id);

    Ok(Json(user.to_response()))
}

/// Login endpoint (OAuth2 password flow: form-encoded username/password)
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    // Unknown username and wrong password collapse into the same 401
    let user = User::find_by_username(&state.pool, &form.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    verify_password(&form.password, &user.password_hash)?;

    let access_token = issue_token(
        &user.username,
        &state.config.jwt_secret,
        state.config.access_token_expire_minutes,
    )?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// Issue a signed access token for the given username
pub fn issue_token(username: &str, secret: &str, expire_minutes: i64) -> AppResult<String> {
    let exp = Utc::now() + Duration::minutes(expire_minutes);

    let claims = Claims {
        sub: username.to_string(),
        exp: exp.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(e.to_string()))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .to_string())
}

fn verify_password(password: &str, password_hash: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::InternalError("Invalid password hash".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("alice", SECRET, 30).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(data.claims.sub, "alice");
        assert!(data.claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default 60s validation leeway
        let token = issue_token("alice", SECRET, -5).unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        );

        assert!(matches!(
            result.map_err(AppError::from),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_mis_signed_token_rejected() {
        let token = issue_token("alice", SECRET, 30).unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let result = decode::<Claims>(
            "not-a-jwt",
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("pw123").unwrap();

        // One-way: the stored value never contains the plaintext form
        assert_ne!(hash, "pw123");

        assert!(verify_password("pw123", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("pw123").unwrap();
        let b = hash_password("pw123").unwrap();
        assert_ne!(a, b);
    }
}
