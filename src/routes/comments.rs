use crate::{
    auth::AuthenticatedUser,
    db,
    error::AppError,
    models::{comment::COMMENT_COLUMNS, Comment, CommentInput},
    permissions::{check_object_permission, IsOwnerOrReadOnly},
};
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

async fn fetch_comment(pool: &PgPool, id: Uuid) -> Result<Comment, AppError> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE id = $1",
        COMMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

/// Comments on a task, oldest first.
#[get("/{id}/comments")]
pub async fn list_task_comments(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = db::fetch_task(pool.get_ref(), task_id.into_inner()).await?;

    let comments = sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE task_id = $1 ORDER BY created_on",
        COMMENT_COLUMNS
    ))
    .bind(task.id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(comments))
}

#[post("/{id}/comments")]
pub async fn create_task_comment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    comment_data: web::Json<CommentInput>,
) -> Result<impl Responder, AppError> {
    comment_data.validate()?;
    let task = db::fetch_task(pool.get_ref(), task_id.into_inner()).await?;

    let comment = sqlx::query_as::<_, Comment>(&format!(
        "INSERT INTO comments (id, task_id, author_id, body) VALUES ($1, $2, $3, $4) RETURNING {}",
        COMMENT_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(task.id)
    .bind(user.id)
    .bind(&comment_data.body)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Edits a comment. Author only.
#[put("/{id}")]
pub async fn update_comment(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    comment_id: web::Path<Uuid>,
    comment_data: web::Json<CommentInput>,
) -> Result<impl Responder, AppError> {
    comment_data.validate()?;
    let comment = fetch_comment(pool.get_ref(), comment_id.into_inner()).await?;
    check_object_permission(&IsOwnerOrReadOnly, req.method(), &user, &comment)?;

    let updated = sqlx::query_as::<_, Comment>(&format!(
        "UPDATE comments SET body = $1 WHERE id = $2 RETURNING {}",
        COMMENT_COLUMNS
    ))
    .bind(&comment_data.body)
    .bind(comment.id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes a comment. Author only.
#[delete("/{id}")]
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    comment_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let comment = fetch_comment(pool.get_ref(), comment_id.into_inner()).await?;
    check_object_permission(&IsOwnerOrReadOnly, req.method(), &user, &comment)?;

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment.id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
