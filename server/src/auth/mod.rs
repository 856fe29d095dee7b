//! Principal tokens and the request extractor
//!
//! HS256 bearer tokens carry a principal: a store, a runner, or the
//! system (trusted backends recording cash payments, operator tooling).
//! Authorization is a precondition check in handlers, not a middleware
//! layer.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::ServerState;
use crate::utils::AppError;

const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Who a token speaks for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Store,
    Runner,
    System,
}

/// JWT claims stored in the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id (store id, runner id, or a system name)
    pub sub: String,
    pub role: Role,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// Token issuing and validation
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_token(&self, subject: impl Into<String>, role: Role) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.into(),
            role,
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// Pull the bearer token out of an Authorization header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// Authenticated caller, extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }

    /// Caller must be the named store, or the system
    pub fn ensure_store(&self, store_id: &str) -> Result<(), AppError> {
        match self.role {
            Role::System => Ok(()),
            Role::Store if self.id == store_id => Ok(()),
            _ => Err(AppError::forbidden("not authorized for this store")),
        }
    }

    /// Caller must be the named runner, or the system
    pub fn ensure_runner(&self, runner_id: &str) -> Result<(), AppError> {
        match self.role {
            Role::System => Ok(()),
            Role::Runner if self.id == runner_id => Ok(()),
            _ => Err(AppError::forbidden("not authorized for this runner")),
        }
    }
}

impl FromRequestParts<ServerState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token =
            JwtService::extract_from_header(auth_header).ok_or(AppError::Unauthorized)?;

        let claims = state
            .jwt
            .validate_token(token)
            .map_err(|_| AppError::Unauthorized)?;

        Ok(Principal {
            id: claims.sub,
            role: claims.role,
        })
    }
}
