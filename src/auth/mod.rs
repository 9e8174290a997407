pub mod extractors;
pub mod middleware;
pub mod password;
pub mod revocation;
pub mod token;

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub use extractors::{AuthenticatedUser, BearerToken};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use revocation::RevokedTokens;
pub use token::{generate_token, verify_token, Claims};

lazy_static! {
    // Letters, digits, underscores and hyphens.
    pub(crate) static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Returns the token part of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Canonical form of an email address: trimmed and lowercased.
/// Stored that way and compared that way.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_login_identity(req: &LoginRequest) -> Result<(), ValidationError> {
    if req.username.is_none() && req.email.is_none() {
        let mut err = ValidationError::new("identity_required");
        err.message = Some("Provide a username or an email".into());
        return Err(err);
    }
    Ok(())
}

/// Payload for `POST /api/auth/login`. Identifies the account by `username`
/// or by `email`; when both are sent the username wins.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_login_identity"))]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 32))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: String,
}

/// How a login request names its account.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginIdentity {
    Username(String),
    Email(String),
}

impl LoginRequest {
    pub fn identity(&self) -> Option<LoginIdentity> {
        match (&self.username, &self.email) {
            (Some(username), _) => Some(LoginIdentity::Username(username.clone())),
            (None, Some(email)) => Some(LoginIdentity::Email(normalize_email(email))),
            (None, None) => None,
        }
    }
}

/// Payload for `POST /api/auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// 3 to 32 characters; letters, digits, underscores or hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
}
