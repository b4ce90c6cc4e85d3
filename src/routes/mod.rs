pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

/// Registers every `/api` route. Mount inside a scope wrapped by `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::logout),
    )
    .service(
        web::scope("/users")
            .service(users::create_user)
            .service(users::list_users)
            .service(users::get_user)
            .service(users::update_user)
            .service(users::delete_user),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task)
            .service(tasks::create_comment)
            .service(tasks::get_comments)
            .service(tasks::get_comment)
            .service(tasks::update_comment)
            .service(tasks::delete_comment),
    );
}
