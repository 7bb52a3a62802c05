//! Authentication: password hashing, token issuance, request gate

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{ClaimSet, Claims, TokenError, TokenService};
pub use middleware::{authenticate, extract_bearer, require_bearer, AuthContext, GateRejection};
pub use password::PasswordHasher;
