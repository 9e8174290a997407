#[macro_use]
mod common;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http::header, http::Method, http::StatusCode, rt, test, web, App, HttpServer};
use common::{cleanup_user, lazy_pool, register_user, send, set_jwt_secret, test_pool};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::net::TcpListener;
use todo_api::auth::{AuthMiddleware, AuthResponse, RevokedTokens};
use todo_api::routes::{self, health};

#[test_log::test(actix_web::test)]
async fn test_protected_routes_reject_missing_and_bad_tokens() {
    set_jwt_secret();
    let pool = lazy_pool();
    let app = test_app!(pool);

    let req = test::TestRequest::get().uri("/api/tasks").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing token");

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .append_header((header::AUTHORIZATION, "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_register_rejects_invalid_payload_without_token() {
    set_jwt_secret();
    let pool = lazy_pool();
    let app = test_app!(pool);

    // Public path: reaches the handler, which rejects the payload before any query.
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "ok_name", "email": "nope", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn test_create_task_unauthorized_over_http() {
    set_jwt_secret();
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(|| {
        App::new()
            .app_data(web::Data::new(lazy_pool()))
            .app_data(web::Data::new(RevokedTokens::new()))
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
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/api/tasks", port))
        .json(&json!({ "task_name": "Unauthorized Task" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.expect("JSON error body");
    assert_eq!(body["error"], "Missing token");

    handle.stop(false).await;
}

#[test_log::test(actix_web::test)]
async fn test_register_login_logout_flow() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let app = test_app!(pool);

    let user = register_user(&app, "flow").await;

    // Same email again, in another case.
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": common::unique("other"),
            "email": user.email.to_uppercase(),
            "password": user.password
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Wrong password.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": user.email, "password": "WrongPassword!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Unknown email gets the same answer.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "nobody_here@example.com", "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": user.email, "password": user.password }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(login.user_id, user.id);

    // Email lookup ignores case.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": user.email.to_uppercase(), "password": user.password }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Username works as well.
    let (_, me) = send(&app, &user, Method::GET, &format!("/api/users/{}", user.id), None).await;
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": me["username"], "password": user.password }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let by_name: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(by_name.user_id, user.id);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": me["username"], "password": "WrongPassword!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Registration created an empty profile.
    let (status, profile) = send(&app, &user, Method::GET, "/api/users/me/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user_id"], user.id);
    assert!(profile["bio"].is_null());

    let (status, profile) = send(
        &app,
        &user,
        Method::PUT,
        "/api/users/me/profile",
        Some(json!({ "bio": "Lists all the way down", "location": "Tel Aviv" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["bio"], "Lists all the way down");

    let (status, me) = send(&app, &user, Method::GET, &format!("/api/users/{}", user.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], user.email.as_str());
    assert_eq!(me["is_staff"], false);
    assert!(me.get("password_hash").is_none());

    let (status, _) = send(&app, &user, Method::POST, "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, &user, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has been revoked");

    cleanup_user(&pool, &user).await;
}

#[actix_web::test]
async fn test_unknown_user_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let app = test_app!(pool);
    let user = register_user(&app, "lookup").await;

    let (status, _) = send(&app, &user, Method::GET, "/api/users/2147483647", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    cleanup_user(&pool, &user).await;
}
