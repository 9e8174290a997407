use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: i32,
    pub body: String,
    pub created_on: DateTime<Utc>,
}

pub const COMMENT_COLUMNS: &str = "id, task_id, author_id, body, created_on";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_input_validation() {
        assert!(CommentInput {
            body: "Blocked on the design review.".to_string()
        }
        .validate()
        .is_ok());
        assert!(CommentInput {
            body: String::new()
        }
        .validate()
        .is_err());
        assert!(CommentInput {
            body: "z".repeat(2001)
        }
        .validate()
        .is_err());
    }
}
