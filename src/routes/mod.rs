pub mod auth;
pub mod comments;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::error::{json_error_handler, path_error_handler, query_error_handler};

/// Routes mounted under `/api`. Literal segments are registered before
/// `/{id}` patterns that would otherwise capture them.
///
/// Also installs the extractor configs so rejected bodies, queries and paths
/// answer with the same `{"error": ...}` JSON as handler errors.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register)
                .service(auth::logout),
        )
        .service(
            web::scope("/users")
                .service(users::list_users)
                .service(users::get_profile)
                .service(users::update_profile)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::sort_tasks)
                .service(tasks::tasks_named)
                .service(comments::list_task_comments)
                .service(comments::create_task_comment)
                .service(tasks::update_task_status)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/comments")
                .service(comments::update_comment)
                .service(comments::delete_comment),
        )
        .service(
            web::scope("/projects")
                .service(projects::list_projects)
                .service(projects::create_project)
                .service(projects::list_members)
                .service(projects::add_member)
                .service(projects::remove_member)
                .service(projects::project_tasks)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project),
        );
}
