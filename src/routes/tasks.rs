use crate::{
    auth::AuthenticatedUser,
    db,
    error::AppError,
    models::{
        task::TASK_COLUMNS, Task, TaskInput, TaskQuery, TaskSort, TaskStatusInput,
        TaskStatusSummary,
    },
    permissions::{check_object_permission, IsAssigneeOrTeamMemberOrOwner},
};
use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse, Responder};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Wraps `search` for ILIKE, escaping the pattern metacharacters it contains.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn filtered_tasks<'a>(query: &TaskQuery) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS));

    if let Some(status) = query.task_status {
        builder.push(" AND task_status = ").push_bind(status);
    }
    if let Some(priority) = query.priority_level {
        builder.push(" AND priority_level = ").push_bind(priority);
    }
    if let Some(project_id) = query.project_id {
        builder.push(" AND project_id = ").push_bind(project_id);
    }
    if let Some(assigned_to) = query.assigned_to {
        builder.push(" AND assigned_to = ").push_bind(assigned_to);
    }
    if let Some(created_by) = query.created_by {
        builder.push(" AND created_by = ").push_bind(created_by);
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search.trim());
        builder
            .push(" AND (task_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    builder
}

/// Whether the caller may place tasks in, or take tasks out of, a project:
/// staff, the project's owner, or a member of its team.
///
/// A project that does not exist is a bad reference, not a missing resource.
async fn on_project_team(
    pool: &PgPool,
    user: &AuthenticatedUser,
    project_id: Uuid,
) -> Result<bool, AppError> {
    let project = db::fetch_project(pool, project_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::BadRequest("Project does not exist".into()),
            other => other,
        })?;
    Ok(user.is_staff
        || project.created_by == Some(user.id)
        || db::is_team_member(pool, project_id, user.id).await?)
}

/// Checks a move of a task from `current` to `requested` project.
///
/// Leaving a project needs team access to it, and so does joining one.
/// Keeping the same project needs nothing beyond the task's own write rule.
async fn check_project_move(
    pool: &PgPool,
    user: &AuthenticatedUser,
    current: Option<Uuid>,
    requested: Option<Uuid>,
) -> Result<(), AppError> {
    if current == requested {
        return Ok(());
    }
    if let Some(project_id) = current {
        if !on_project_team(pool, user, project_id).await? {
            return Err(AppError::Forbidden(
                "Only the project's team may move tasks out of it".into(),
            ));
        }
    }
    if let Some(project_id) = requested {
        if !on_project_team(pool, user, project_id).await? {
            return Err(AppError::Forbidden(
                "Only the project's team may add tasks to it".into(),
            ));
        }
    }
    Ok(())
}

async fn check_assignee(pool: &PgPool, assigned_to: Option<i32>) -> Result<(), AppError> {
    if let Some(assignee) = assigned_to {
        if !db::user_exists(pool, assignee).await? {
            return Err(AppError::BadRequest("Assignee does not exist".into()));
        }
    }
    Ok(())
}

/// Loads a task and checks that the caller may perform this request's method on it.
async fn task_for_write(
    pool: &PgPool,
    req: &HttpRequest,
    user: &AuthenticatedUser,
    task_id: Uuid,
) -> Result<Task, AppError> {
    let task = db::fetch_task(pool, task_id).await?;
    let permission = IsAssigneeOrTeamMemberOrOwner {
        is_team_member: db::is_task_team_member(pool, &task, user.id).await?,
    };
    check_object_permission(&permission, req.method(), user, &task)?;
    Ok(task)
}

/// Lists tasks, newest first.
///
/// ## Query Parameters:
/// - `task_status`: `planned`, `working_on`, `completed` or `canceled`.
/// - `priority_level`: `low`, `medium` or `high`.
/// - `project_id`, `assigned_to`, `created_by`: exact matches.
/// - `search`: case-insensitive match in name or description.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let mut builder = filtered_tasks(&query_params);
    builder.push(" ORDER BY created_on DESC");

    let tasks = builder
        .build_query_as::<Task>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Lists tasks in the order given by `by` (`due_date`, `created_on`,
/// `priority_level`, `task_name`) and `order` (`asc`, `desc`).
/// Tasks without a due date come last.
#[get("/sort")]
pub async fn sort_tasks(
    pool: web::Data<PgPool>,
    sort: web::Query<TaskSort>,
) -> Result<impl Responder, AppError> {
    let mut builder = filtered_tasks(&TaskQuery::default());
    builder.push(sort.order_by_clause());

    let tasks = builder
        .build_query_as::<Task>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Status of every task with the given name, ignoring case.
#[get("/named/{task_name}")]
pub async fn tasks_named(
    pool: web::Data<PgPool>,
    task_name: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let summaries = sqlx::query_as::<_, TaskStatusSummary>(
        "SELECT id, task_name, task_status FROM tasks
         WHERE LOWER(task_name) = LOWER($1)
         ORDER BY created_on",
    )
    .bind(task_name.into_inner())
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(summaries))
}

/// Creates a `planned` task owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: unknown project or assignee, or a malformed body.
/// - `403 Forbidden`: the caller is not on the referenced project's team.
/// - `422 Unprocessable Entity`: field validation failed.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate_schedule(None)?;
    check_project_move(pool.get_ref(), &user, None, task_data.project_id).await?;
    check_assignee(pool.get_ref(), task_data.assigned_to).await?;

    let task = Task::new(task_data.into_inner(), user.id);

    let result = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, task_name, description, due_date, task_status, priority_level,
                            project_id, assigned_to, created_by, created_on, updated_on)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.task_name)
    .bind(&task.description)
    .bind(task.due_date)
    .bind(task.task_status)
    .bind(task.priority_level)
    .bind(task.project_id)
    .bind(task.assigned_to)
    .bind(task.created_by)
    .bind(task.created_on)
    .bind(task.updated_on)
    .fetch_one(pool.get_ref())
    .await?;

    log::debug!("user {} created task {}", user.id, result.id);

    Ok(HttpResponse::Created().json(result))
}

#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = db::fetch_task(pool.get_ref(), task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces a task's editable fields. Status is left untouched.
///
/// The past-date rule only applies when the due date changes, and changing
/// the project needs team access to both the old and the new one.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = task_for_write(pool.get_ref(), &req, &user, task_id.into_inner()).await?;
    task_data.validate_schedule(task.due_date)?;
    check_project_move(pool.get_ref(), &user, task.project_id, task_data.project_id).await?;
    check_assignee(pool.get_ref(), task_data.assigned_to).await?;

    let result = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET task_name = $1, description = $2, due_date = $3, priority_level = $4,
             project_id = $5, assigned_to = $6, updated_on = NOW()
         WHERE id = $7
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(&task_data.task_name)
    .bind(&task_data.description)
    .bind(task_data.due_date)
    .bind(task_data.priority_level.unwrap_or_default())
    .bind(task_data.project_id)
    .bind(task_data.assigned_to)
    .bind(task.id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Changes only the status of a task.
#[patch("/{id}/status")]
pub async fn update_task_status(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    status_data: web::Json<TaskStatusInput>,
) -> Result<impl Responder, AppError> {
    let task = task_for_write(pool.get_ref(), &req, &user, task_id.into_inner()).await?;

    let result = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET task_status = $1, updated_on = NOW() WHERE id = $2 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(status_data.task_status)
    .bind(task.id)
    .fetch_one(pool.get_ref())
    .await?;

    log::debug!(
        "user {} moved task {} to {:?}",
        user.id,
        result.id,
        result.task_status
    );

    Ok(HttpResponse::Ok().json(result))
}

#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = task_for_write(pool.get_ref(), &req, &user, task_id.into_inner()).await?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task.id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
