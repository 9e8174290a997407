use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A user account. The password hash is stored in the same row but never loaded here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

pub const USER_COLUMNS: &str = "id, username, email, is_staff, date_joined";

/// Extra details kept one-to-one with a user. Created empty at registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: i32,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub updated_on: DateTime<Utc>,
}

/// Account fields staff may replace through `PUT /api/users/{id}`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UserInput {
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "crate::auth::USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileInput {
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
}
