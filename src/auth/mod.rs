/*!
 * # Operator authentication
 *
 * The back office has a single operator account configured by username and
 * an Argon2 password hash. A successful login issues an HS256 JWT; protected
 * routes require it as `Authorization: Bearer <token>`.
 */

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AppConfig;

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // operator username
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Operator attached to the request by [`auth_middleware`]
#[derive(Debug, Clone, Serialize)]
pub struct Operator {
    pub username: String,
    pub token_id: String,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
    pub operator_username: String,
    pub operator_password_hash: String,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            token_expiration: Duration::from_secs(cfg.jwt_expiration as u64),
            operator_username: cfg.operator_username.clone(),
            operator_password_hash: cfg.operator_password_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "AUTH_MISSING_TOKEN"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_CREDENTIALS"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "AUTH_TOKEN_EXPIRED"),
            Self::TokenCreation(_) | Self::Hashing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_INTERNAL")
            }
        };
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (
            status,
            Json(json!({
                "error": error_code,
                "message": message,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}

/// Hashes a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// False for a wrong password and for a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored operator password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Checks the operator credentials and issues a token.
    pub fn login(&self, request: &LoginRequest) -> Result<TokenResponse, AuthError> {
        if self.config.operator_password_hash.trim().is_empty() {
            warn!("Login attempted but no operator password hash is configured");
            return Err(AuthError::InvalidCredentials);
        }

        let password_ok = verify_password(&request.password, &self.config.operator_password_hash);
        if request.username != self.config.operator_username || !password_ok {
            debug!(username = %request.username, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }

        self.generate_token(&request.username)
    }

    pub fn generate_token(&self, subject: &str) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.token_expiration)
            .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Rejects requests without a valid bearer token and attaches the [`Operator`].
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match bearer_token(request.headers()).and_then(|t| auth.validate_token(t)) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(Operator {
        username: claims.sub,
        token_id: claims.jti,
    });
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service(password: &str) -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "test-secret-with-plenty-of-distinct-characters-0123456789-abcdefgh".into(),
            jwt_issuer: "meu-bentin".into(),
            jwt_audience: "meu-bentin-backoffice".into(),
            token_expiration: Duration::from_secs(600),
            operator_username: "loja".into(),
            operator_password_hash: hash_password(password).unwrap(),
        })
    }

    #[test]
    fn login_issues_a_token_that_validates() {
        let auth = service("bentin123");
        let token = auth
            .login(&LoginRequest {
                username: "loja".into(),
                password: "bentin123".into(),
            })
            .unwrap();
        assert_eq!(token.token_type, "Bearer");

        let claims = auth.validate_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, "loja");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let auth = service("bentin123");
        assert_matches!(
            auth.login(&LoginRequest {
                username: "loja".into(),
                password: "errada".into(),
            }),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = service("a").generate_token("loja").unwrap();
        let mut other = service("a");
        other.config.jwt_secret = "another-secret-entirely-different-0123456789-zyxwvutsrq".into();
        assert_matches!(
            other.validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("x", "not-a-phc-string"));
    }
}
