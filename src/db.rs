//! Connection pool, embedded migrations, and row lookups shared by several
//! route modules.

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    project::PROJECT_COLUMNS, task::TASK_COLUMNS, user::USER_COLUMNS, Project, Task, User,
};

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
}

/// Applies every pending migration under `migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub async fn fetch_task(pool: &PgPool, id: Uuid) -> Result<Task, AppError> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

pub async fn fetch_project(pool: &PgPool, id: Uuid) -> Result<Project, AppError> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects WHERE id = $1",
        PROJECT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

pub async fn fetch_user(pool: &PgPool, id: i32) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn user_exists(pool: &PgPool, id: i32) -> Result<bool, AppError> {
    let (exists,) = sqlx::query_as::<_, (bool,)>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn is_team_member(pool: &PgPool, project_id: Uuid, user_id: i32) -> Result<bool, AppError> {
    let (member,) = sqlx::query_as::<_, (bool,)>(
        "SELECT EXISTS(SELECT 1 FROM team_members WHERE project_id = $1 AND user_id = $2)",
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(member)
}

/// True when the user belongs to the team of the task's project.
/// Tasks outside any project have no team.
pub async fn is_task_team_member(pool: &PgPool, task: &Task, user_id: i32) -> Result<bool, AppError> {
    match task.project_id {
        Some(project_id) => is_team_member(pool, project_id, user_id).await,
        None => Ok(false),
    }
}
