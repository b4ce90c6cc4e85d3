use crate::{
    auth::{AuthenticatedUser, SessionManager},
    error::AppError,
    models::{CreateUserInput, NewUser, UpdateUserInput, UserChanges},
    notification::{NotificationKind, Notifier},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".into())
}

/// Register a new user
///
/// Public. Hashes the password and stores the user. Emails are unique, including
/// those of deleted accounts.
///
/// ## Responses:
/// - `201 Created`: the new user's public profile.
/// - `400 Bad Request`: the email is already registered.
/// - `422 Unprocessable Entity`: validation failed.
#[post("")]
pub async fn create_user(
    sessions: web::Data<SessionManager>,
    notifier: web::Data<Notifier>,
    user_data: web::Json<CreateUserInput>,
) -> Result<impl Responder, AppError> {
    let input = user_data.into_inner().normalized();
    input.validate()?;

    let password_hash = sessions.hash_password(&input.password).await?;
    let user = sessions
        .directory()
        .create(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
        })
        .await?;

    notifier.send(
        &user.email,
        NotificationKind::UserCreated,
        &[("user_name", user.name.as_str())],
    );
    Ok(HttpResponse::Created().json(user))
}

/// Lists all active users.
#[get("")]
pub async fn list_users(
    sessions: web::Data<SessionManager>,
    _user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let users = sessions.directory().list().await?;
    Ok(HttpResponse::Ok().json(users))
}

#[get("/{id}")]
pub async fn get_user(
    sessions: web::Data<SessionManager>,
    user_id: web::Path<Uuid>,
    _user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = sessions
        .directory()
        .find_by_id(user_id.into_inner())
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(user))
}

/// Updates the caller's own profile.
///
/// ## Responses:
/// - `200 OK`: the updated profile.
/// - `403 Forbidden`: the path names another user.
/// - `404 Not Found`: the user does not exist.
#[put("/{id}")]
pub async fn update_user(
    sessions: web::Data<SessionManager>,
    notifier: web::Data<Notifier>,
    user_id: web::Path<Uuid>,
    user_data: web::Json<UpdateUserInput>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user_id = user_id.into_inner();
    if caller.id != user_id {
        return Err(AppError::Forbidden("You can only update your own account".into()));
    }

    let input = user_data.into_inner().normalized();
    input.validate()?;
    if input.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }

    let password_hash = match &input.password {
        Some(password) => Some(sessions.hash_password(password).await?),
        None => None,
    };
    let user = sessions
        .directory()
        .update(
            user_id,
            UserChanges {
                name: input.name,
                email: input.email,
                password_hash,
            },
        )
        .await?
        .ok_or_else(user_not_found)?;

    notifier.send(&user.email, NotificationKind::UserUpdated, &[]);
    Ok(HttpResponse::Ok().json(user))
}

/// Soft-deletes the caller's own account. Its tokens stop authorizing at once.
#[delete("/{id}")]
pub async fn delete_user(
    sessions: web::Data<SessionManager>,
    notifier: web::Data<Notifier>,
    user_id: web::Path<Uuid>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user_id = user_id.into_inner();
    if caller.id != user_id {
        return Err(AppError::Forbidden("You can only delete your own account".into()));
    }

    let user = sessions
        .directory()
        .soft_delete(user_id)
        .await?
        .ok_or_else(user_not_found)?;

    notifier.send(&user.email, NotificationKind::UserDeleted, &[]);
    Ok(HttpResponse::NoContent().finish())
}
