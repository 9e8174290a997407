use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A group of tasks worked on by a team. The creator owns it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<i32>,
    pub created_on: DateTime<Utc>,
}

pub const PROJECT_COLUMNS: &str = "id, name, description, created_by, created_on";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Membership of a user in a project's team.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct TeamMember {
    pub project_id: Uuid,
    pub user_id: i32,
    pub joined_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamMemberInput {
    pub user_id: i32,
}

impl Project {
    pub fn new(input: ProjectInput, user_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            created_by: Some(user_id),
            created_on: Utc::now(),
        }
    }
}
