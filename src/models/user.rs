//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration request body
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Login form body (OAuth2 password flow style: urlencoded username/password)
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// User shape returned by the API; the password hash never leaves the store
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn create(
        pool: &PgPool,
        username: &str,
        email: &str,
        password_hash: String,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Combined duplicate check used at registration: one query covers both
    /// unique columns so the caller cannot tell which one collided.
    pub async fn exists_by_username_or_email(
        pool: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE username = $1 OR email = $2",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(found.is_some())
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_active: self.is_active,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_email_validation() {
        let ok = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "pw123".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "pw123".to_string(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "argon2-hash".to_string(),
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2-hash"));
        assert!(!json.contains("password_hash"));
    }
}
