use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::env;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{AccessClaims, RefreshClaims, RefreshRequest, User};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        AuthConfig {
            access_secret: env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or_else(|_| "dev_access_token_secret_12345".to_string()),
            refresh_secret: env::var("REFRESH_TOKEN_SECRET")
                .unwrap_or_else(|_| "dev_refresh_token_secret_12345".to_string()),
            access_ttl_minutes: env::var("ACCESS_TOKEN_EXPIRY_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            refresh_ttl_days: env::var("REFRESH_TOKEN_EXPIRY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal(format!("failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn issue_access_token(cfg: &AuthConfig, user: &User) -> Result<String, ApiError> {
    let claims = AccessClaims {
        sub: user.id,
        username: user.username.clone(),
        exp: (Utc::now() + chrono::Duration::minutes(cfg.access_ttl_minutes)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.access_secret.as_ref()),
    )
    .map_err(|e| ApiError::internal(format!("failed to sign access token: {}", e)))
}

pub fn issue_refresh_token(cfg: &AuthConfig, user_id: Uuid) -> Result<String, ApiError> {
    let claims = RefreshClaims {
        sub: user_id,
        exp: (Utc::now() + chrono::Duration::days(cfg.refresh_ttl_days)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.refresh_secret.as_ref()),
    )
    .map_err(|e| ApiError::internal(format!("failed to sign refresh token: {}", e)))
}

pub fn decode_access_token(cfg: &AuthConfig, token: &str) -> Result<AccessClaims, ApiError> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(cfg.access_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized("invalid or expired access token"))
}

pub fn decode_refresh_token(cfg: &AuthConfig, token: &str) -> Result<RefreshClaims, ApiError> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(cfg.refresh_secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized("invalid or expired refresh token"))
}

/// Access credential from the Authorization bearer header or the
/// `accessToken` cookie.
fn access_token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(String::from);
    bearer.or_else(|| req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string()))
}

pub fn authenticate(req: &HttpRequest, cfg: &AuthConfig) -> Result<AccessClaims, ApiError> {
    let token = access_token_from_request(req)
        .ok_or_else(|| ApiError::unauthorized("missing access token"))?;
    decode_access_token(cfg, &token)
}

/// Anonymous access is allowed on public reads; an invalid token is treated
/// the same as no token there.
pub fn authenticate_opt(req: &HttpRequest, cfg: &AuthConfig) -> Option<AccessClaims> {
    access_token_from_request(req).and_then(|t| decode_access_token(cfg, &t).ok())
}

/// Refresh credential from the `refreshToken` cookie or the request body.
pub fn refresh_token_from_request(req: &HttpRequest, body: &RefreshRequest) -> Option<String> {
    req.cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.refresh_token.clone())
}
