use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;

use todo_api::{
    auth::{AuthMiddleware, RevokedTokens},
    config::Config,
    db,
    routes::{self, health},
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = db::connect(&config).await.map_err(|e| {
        log::error!("failed to connect to database: {}", e);
        io::Error::new(io::ErrorKind::ConnectionRefused, e)
    })?;

    db::migrate(&pool).await.map_err(|e| {
        log::error!("failed to run migrations: {}", e);
        io::Error::new(io::ErrorKind::Other, e)
    })?;
    log::info!("database migrations applied");

    let pool = web::Data::new(pool);
    let revoked = web::Data::new(RevokedTokens::new());

    log::info!("starting todo-api at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(revoked.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
