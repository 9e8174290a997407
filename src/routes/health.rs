use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;

const PING_TIMEOUT: Duration = Duration::from_secs(2);

async fn ping(pool: &PgPool) -> bool {
    matches!(
        tokio::time::timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await,
        Ok(Ok(_))
    )
}

/// Health check endpoint
///
/// Reports whether the database answers. Responds 503 when it does not.
/// Without a configured pool the database state is `"unknown"`.
#[get("/health")]
pub async fn health(req: HttpRequest) -> impl Responder {
    let database = match req.app_data::<web::Data<PgPool>>() {
        Some(pool) => {
            if ping(pool.get_ref()).await {
                "up"
            } else {
                "down"
            }
        }
        None => "unknown",
    };

    let body = json!({
        "status": if database == "down" { "degraded" } else { "ok" },
        "database": database,
        "timestamp": Utc::now()
    });

    if database == "down" {
        log::warn!("health check: database unreachable");
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}
