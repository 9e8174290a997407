use crate::{
    auth::{
        generate_token, hash_password, normalize_email, verify_password, AuthResponse,
        BearerToken, LoginIdentity, LoginRequest, RegisterRequest, RevokedTokens,
    },
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates the account and its empty profile, then returns a token.
/// Fails with 409 when the email (compared case-insensitively) or the
/// username is taken.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let email = normalize_email(&register_data.email);

    let existing = sqlx::query_as::<_, (bool, bool)>(
        "SELECT COALESCE(BOOL_OR(LOWER(email) = $1), FALSE), \
                COALESCE(BOOL_OR(username = $2), FALSE) \
         FROM users WHERE LOWER(email) = $1 OR username = $2",
    )
    .bind(&email)
    .bind(&register_data.username)
    .fetch_one(pool.get_ref())
    .await?;

    match existing {
        (true, _) => return Err(AppError::Conflict("Email already registered".into())),
        (_, true) => return Err(AppError::Conflict("Username already taken".into())),
        _ => {}
    }

    let password_hash = hash_password(&register_data.password)?;

    let mut tx = pool.begin().await?;
    let (user_id,) = sqlx::query_as::<_, (i32,)>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&register_data.username)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await?;
    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    log::info!("registered user {} ({})", user_id, register_data.username);

    let token = generate_token(user_id, false)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user_id }))
}

/// Login user
///
/// Accepts a username or an email with the password and returns a fresh
/// token. Unknown accounts and wrong passwords give the same 401.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let lookup = match login_data.identity() {
        Some(LoginIdentity::Username(username)) => sqlx::query_as::<_, (i32, String, bool)>(
            "SELECT id, password_hash, is_staff FROM users WHERE username = $1",
        )
        .bind(username),
        Some(LoginIdentity::Email(email)) => sqlx::query_as::<_, (i32, String, bool)>(
            "SELECT id, password_hash, is_staff FROM users WHERE LOWER(email) = $1",
        )
        .bind(email),
        None => return Err(AppError::BadRequest("Provide a username or an email".into())),
    };
    let user = lookup.fetch_optional(pool.get_ref()).await?;

    let Some((user_id, password_hash, is_staff)) = user else {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };
    if !verify_password(&login_data.password, &password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    log::debug!("user {} logged in", user_id);
    let token = generate_token(user_id, is_staff)?;
    Ok(HttpResponse::Ok().json(AuthResponse { token, user_id }))
}

/// Logout user
///
/// Revokes the bearer token used for this request until it would expire.
#[post("/logout")]
pub async fn logout(
    revoked: web::Data<RevokedTokens>,
    bearer: BearerToken,
) -> Result<impl Responder, AppError> {
    revoked.revoke(&bearer.token, bearer.claims.exp);
    log::info!("user {} logged out", bearer.claims.sub);
    Ok(HttpResponse::NoContent().finish())
}
