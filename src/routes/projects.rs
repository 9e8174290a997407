use crate::{
    auth::AuthenticatedUser,
    db,
    error::AppError,
    models::{
        project::PROJECT_COLUMNS, task::TASK_COLUMNS, Project, ProjectInput, Task, TeamMember,
        TeamMemberInput,
    },
    permissions::{check_object_permission, IsOwnerOrReadOnly},
};
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Loads a project and checks that the caller owns it (or the method is safe).
async fn project_for_write(
    pool: &PgPool,
    req: &HttpRequest,
    user: &AuthenticatedUser,
    project_id: Uuid,
) -> Result<Project, AppError> {
    let project = db::fetch_project(pool, project_id).await?;
    check_object_permission(&IsOwnerOrReadOnly, req.method(), user, &project)?;
    Ok(project)
}

#[get("")]
pub async fn list_projects(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects ORDER BY created_on DESC",
        PROJECT_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(projects))
}

/// Creates a project owned by the caller, who also joins its team.
#[post("")]
pub async fn create_project(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    project_data: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let project = Project::new(project_data.into_inner(), user.id);

    let mut tx = pool.begin().await?;
    let created = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (id, name, description, created_by, created_on)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        PROJECT_COLUMNS
    ))
    .bind(project.id)
    .bind(&project.name)
    .bind(&project.description)
    .bind(project.created_by)
    .bind(project.created_on)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query("INSERT INTO team_members (project_id, user_id) VALUES ($1, $2)")
        .bind(created.id)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!("user {} created project {}", user.id, created.id);

    Ok(HttpResponse::Created().json(created))
}

#[get("/{id}")]
pub async fn get_project(
    pool: web::Data<PgPool>,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = db::fetch_project(pool.get_ref(), project_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[put("/{id}")]
pub async fn update_project(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
    project_data: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let project = project_for_write(pool.get_ref(), &req, &user, project_id.into_inner()).await?;

    let updated = sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects SET name = $1, description = $2 WHERE id = $3 RETURNING {}",
        PROJECT_COLUMNS
    ))
    .bind(&project_data.name)
    .bind(&project_data.description)
    .bind(project.id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes a project together with its tasks and team.
#[delete("/{id}")]
pub async fn delete_project(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = project_for_write(pool.get_ref(), &req, &user, project_id.into_inner()).await?;

    sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project.id)
        .execute(pool.get_ref())
        .await?;

    log::info!("user {} deleted project {}", user.id, project.id);

    Ok(HttpResponse::NoContent().finish())
}

#[get("/{id}/members")]
pub async fn list_members(
    pool: web::Data<PgPool>,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = db::fetch_project(pool.get_ref(), project_id.into_inner()).await?;

    let members = sqlx::query_as::<_, TeamMember>(
        "SELECT project_id, user_id, joined_on FROM team_members
         WHERE project_id = $1 ORDER BY joined_on",
    )
    .bind(project.id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(members))
}

/// Adds a user to the project's team. Owner only; 409 if already a member.
#[post("/{id}/members")]
pub async fn add_member(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
    member_data: web::Json<TeamMemberInput>,
) -> Result<impl Responder, AppError> {
    let project = project_for_write(pool.get_ref(), &req, &user, project_id.into_inner()).await?;

    if !db::user_exists(pool.get_ref(), member_data.user_id).await? {
        return Err(AppError::BadRequest("User does not exist".into()));
    }
    if db::is_team_member(pool.get_ref(), project.id, member_data.user_id).await? {
        return Err(AppError::Conflict("User is already a team member".into()));
    }

    let member = sqlx::query_as::<_, TeamMember>(
        "INSERT INTO team_members (project_id, user_id) VALUES ($1, $2)
         RETURNING project_id, user_id, joined_on",
    )
    .bind(project.id)
    .bind(member_data.user_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(member))
}

#[delete("/{id}/members/{user_id}")]
pub async fn remove_member(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, i32)>,
) -> Result<impl Responder, AppError> {
    let (project_id, member_id) = path.into_inner();
    let project = project_for_write(pool.get_ref(), &req, &user, project_id).await?;

    let result = sqlx::query("DELETE FROM team_members WHERE project_id = $1 AND user_id = $2")
        .bind(project.id)
        .bind(member_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Team member not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Tasks that belong to the project, newest first.
#[get("/{id}/tasks")]
pub async fn project_tasks(
    pool: web::Data<PgPool>,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = db::fetch_project(pool.get_ref(), project_id.into_inner()).await?;

    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE project_id = $1 ORDER BY created_on DESC",
        TASK_COLUMNS
    ))
    .bind(project.id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(tasks))
}
