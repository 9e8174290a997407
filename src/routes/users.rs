use crate::{
    auth::{normalize_email, AuthenticatedUser},
    db,
    error::AppError,
    models::{user::USER_COLUMNS, Profile, ProfileInput, User, UserInput},
    permissions::{check_object_permission, IsStaffOrReadOnly},
};
use actix_web::{delete, get, put, web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Lists every user, ordered by id. Read-only.
#[get("")]
pub async fn list_users(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY id",
        USER_COLUMNS
    ))
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

#[get("/{id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user = db::fetch_user(pool.get_ref(), user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Replaces a user's username, email and staff flag. Staff only.
///
/// A changed staff flag takes effect on that user's next login, when a new
/// token is issued. Taken usernames or emails give 409.
#[put("/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    user_id: web::Path<i32>,
    user_data: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let account = db::fetch_user(pool.get_ref(), user_id.into_inner()).await?;
    check_object_permission(&IsStaffOrReadOnly, req.method(), &user, &account)?;

    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET username = $1, email = $2, is_staff = $3 WHERE id = $4 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&user_data.username)
    .bind(normalize_email(&user_data.email))
    .bind(user_data.is_staff)
    .bind(account.id)
    .fetch_one(pool.get_ref())
    .await?;

    log::info!(
        "user {} updated account {} (staff: {})",
        user.id,
        updated.id,
        updated.is_staff
    );

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes an account with its profile, tasks, projects and comments. Staff only.
#[delete("/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    user: AuthenticatedUser,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let account = db::fetch_user(pool.get_ref(), user_id.into_inner()).await?;
    check_object_permission(&IsStaffOrReadOnly, req.method(), &user, &account)?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(account.id)
        .execute(pool.get_ref())
        .await?;

    log::info!("user {} deleted account {}", user.id, account.id);

    Ok(HttpResponse::NoContent().finish())
}

/// The caller's own profile.
#[get("/me/profile")]
pub async fn get_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let profile = sqlx::query_as::<_, Profile>(
        "SELECT user_id, bio, location, updated_on FROM profiles WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Replaces the caller's bio and location. Creates the row if it is missing.
#[put("/me/profile")]
pub async fn update_profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    profile_data: web::Json<ProfileInput>,
) -> Result<impl Responder, AppError> {
    profile_data.validate()?;

    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (user_id, bio, location) VALUES ($1, $2, $3)
         ON CONFLICT (user_id) DO UPDATE
         SET bio = EXCLUDED.bio, location = EXCLUDED.location, updated_on = NOW()
         RETURNING user_id, bio, location, updated_on",
    )
    .bind(user.id)
    .bind(&profile_data.bio)
    .bind(&profile_data.location)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(profile))
}
