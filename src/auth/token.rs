use crate::{
    config::{parse_var, ConfigError},
    error::AppError,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user's id.
    pub sub: i32,
    /// Whether the user is staff. Staff pass every object permission check.
    #[serde(default)]
    pub staff: bool,
    /// Expiration timestamp, seconds since the epoch.
    pub exp: usize,
}

fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET").map_err(|_| {
        log::error!("JWT_SECRET is not set");
        AppError::InternalServerError("JWT_SECRET not set".into())
    })
}

/// Token lifetime from `JWT_EXPIRATION_HOURS` (24 when unset). Must be a
/// positive number of hours that fits a timestamp.
pub fn token_lifetime() -> Result<Duration, ConfigError> {
    const KEY: &str = "JWT_EXPIRATION_HOURS";
    let hours: i64 = parse_var(KEY, 24)?;
    Duration::try_hours(hours)
        .filter(|_| hours > 0)
        .ok_or_else(|| ConfigError::Invalid {
            key: KEY,
            value: hours.to_string(),
        })
}

/// Issues a signed token for `user_id`, valid for `token_lifetime()`.
pub fn generate_token(user_id: i32, is_staff: bool) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(token_lifetime()?)
        .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        staff: is_staff,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Checks signature and expiry, returning the decoded claims.
///
/// Returns `AppError::Unauthorized` for malformed, tampered or expired tokens.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}
