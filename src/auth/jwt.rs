//! JWT token issuance and verification
//!
//! Tokens are HS256-signed with a process-wide secret and expire a fixed
//! interval after issuance. There is no refresh token and no server-side
//! record of issued tokens.

use crate::{config::SecurityConfig, error::AppError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Identity snapshot carried by a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSet {
    pub subject: Uuid,
    pub name: String,
}

/// JWT claims as they appear on the wire
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,

    /// Display name at issuance time
    pub name: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

impl Claims {
    pub fn claim_set(&self) -> ClaimSet {
        ClaimSet {
            subject: self.sub,
            name: self.name.clone(),
        }
    }
}

/// Why a token was refused.
///
/// Callers log the kind; clients only ever see a plain 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature is valid but `exp` has passed
    Expired,
    /// Signature does not match or the header names another algorithm
    Tampered,
    /// Not a decodable JWT or required claims are missing
    Malformed,
}

impl TokenError {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::Expired => "expired",
            TokenError::Tampered => "tampered",
            TokenError::Malformed => "malformed",
        }
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::Tampered,
            _ => TokenError::Malformed,
        }
    }
}

/// JWT service
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create token service from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        let secret = config.jwt_secret.expose_secret();

        if secret.trim().is_empty() {
            return Err(AppError::Config("JWT secret must not be empty".to_string()));
        }
        if secret.len() < 32 {
            tracing::warn!("JWT secret is shorter than 32 bytes; use a longer secret in production");
        }

        let ttl_secs = i64::try_from(config.token_ttl_secs)
            .map_err(|_| AppError::Config("token_ttl_secs out of range".to_string()))?;

        // Only HS256 is accepted, whatever the header claims
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Issue a token stamped with the current time
    pub fn issue(&self, claims: &ClaimSet) -> Result<String, AppError> {
        self.issue_at(claims, Utc::now())
    }

    /// Issue a token as if it had been issued at `issued_at`
    pub fn issue_at(&self, claims: &ClaimSet, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let expiration = issued_at + self.ttl;

        let claims = Claims {
            sub: claims.subject,
            name: claims.name.clone(),
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = ?e, "Failed to encode token");
            AppError::internal_error("Failed to encode token")
        })
    }

    /// Validate and decode token
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let kind = TokenError::from(e);
                tracing::debug!(reason = %kind, "Token validation failed");
                kind
            })
    }
}
