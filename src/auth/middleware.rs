//! Bearer token access gate

use crate::{
    auth::jwt::{Claims, TokenError, TokenService},
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::{fmt, sync::Arc};
use uuid::Uuid;

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated identity attached to request extensions.
///
/// Built from the token alone. The store is not consulted, so a user who
/// was renamed or deleted after issuance still passes with the old claims
/// until the token expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Server-side reason for turning a request away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    MissingHeader,
    InvalidScheme,
    EmptyToken,
    Token(TokenError),
}

impl GateRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateRejection::MissingHeader => "missing_header",
            GateRejection::InvalidScheme => "invalid_scheme",
            GateRejection::EmptyToken => "empty_token",
            GateRejection::Token(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, GateRejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateRejection::MissingHeader)?
        .to_str()
        .map_err(|_| GateRejection::InvalidScheme)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(GateRejection::InvalidScheme)?
        .trim();

    if token.is_empty() {
        return Err(GateRejection::EmptyToken);
    }

    Ok(token)
}

/// Resolve the request headers to an identity, without side effects
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthContext, GateRejection> {
    let token = extract_bearer(headers)?;
    let claims = tokens.verify(token).map_err(GateRejection::Token)?;
    Ok(AuthContext::from(claims))
}

/// JWT 认证中间件 - 必须认证
pub async fn require_bearer(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_context = match authenticate(&tokens, req.headers()) {
        Ok(ctx) => ctx,
        Err(rejection) => {
            match rejection {
                GateRejection::Token(TokenError::Tampered) => {
                    tracing::warn!(reason = %rejection, "Rejected request with tampered token")
                }
                _ => tracing::debug!(reason = %rejection, "Rejected unauthenticated request"),
            }
            metrics::counter!("auth_gate_rejections_total", "reason" => rejection.as_str())
                .increment(1);
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(user_id = %auth_context.user_id, "Request authenticated");

    // 附加到请求扩展
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::jwt::ClaimSet, config::{PasswordHashConfig, SecurityConfig}};
    use secrecy::Secret;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn token_service() -> TokenService {
        TokenService::from_config(&SecurityConfig {
            jwt_secret: Secret::new("middleware-test-secret-32-characters".to_string()),
            token_ttl_secs: 7200,
            password_hash: PasswordHashConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
        })
        .unwrap()
    }

    #[test]
    fn test_extract_bearer_valid() {
        let headers = headers_with("Bearer test_token_123");
        assert_eq!(extract_bearer(&headers), Ok("test_token_123"));
    }

    #[test]
    fn test_extract_bearer_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), Err(GateRejection::MissingHeader));
    }

    #[test]
    fn test_extract_bearer_invalid_scheme() {
        assert_eq!(
            extract_bearer(&headers_with("InvalidFormat")),
            Err(GateRejection::InvalidScheme)
        );
        assert_eq!(
            extract_bearer(&headers_with("Basic dXNlcjpwYXNz")),
            Err(GateRejection::InvalidScheme)
        );
        assert_eq!(
            extract_bearer(&headers_with("bearer abc")),
            Err(GateRejection::InvalidScheme)
        );
    }

    #[test]
    fn test_extract_bearer_empty_token() {
        assert_eq!(extract_bearer(&headers_with("Bearer ")), Err(GateRejection::EmptyToken));
        assert_eq!(extract_bearer(&headers_with("Bearer    ")), Err(GateRejection::EmptyToken));
    }

    #[test]
    fn test_authenticate_resolves_subject() {
        let tokens = token_service();
        let subject = Uuid::new_v4();
        let token = tokens
            .issue(&ClaimSet {
                subject,
                name: "Alice".to_string(),
            })
            .unwrap();

        let ctx = authenticate(&tokens, &headers_with(&format!("Bearer {}", token))).unwrap();
        assert_eq!(ctx.user_id, subject);
        assert_eq!(ctx.name, "Alice");
    }

    #[test]
    fn test_authenticate_reports_token_kind() {
        let tokens = token_service();
        assert_eq!(
            authenticate(&tokens, &headers_with("Bearer not.a.jwt")),
            Err(GateRejection::Token(TokenError::Malformed))
        );
    }
}
