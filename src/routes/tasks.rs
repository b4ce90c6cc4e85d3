use crate::{
    auth::{AuthenticatedUser, SessionManager},
    error::AppError,
    models::{CommentInput, CreateTaskInput, TaskQuery, UpdateTaskInput},
    tasks::TaskStore,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Rejects assignees that do not exist or were deleted. A directory outage is a 503.
async fn ensure_assignee_exists(sessions: &SessionManager, user_id: Uuid) -> Result<(), AppError> {
    match sessions.directory().find_by_id(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest("Assigned user not found".into())),
    }
}

/// Retrieves the tasks the authenticated user created or is assigned to.
///
/// ## Query Parameters:
/// - `status` (optional): `pending`, `in_progress` or `completed`.
/// - `assigned_to` (optional): only tasks assigned to this user ID.
///
/// ## Responses:
/// - `200 OK`: a JSON array of tasks, newest first.
/// - `401 Unauthorized`: missing, expired or revoked token.
#[get("")]
pub async fn get_tasks(
    store: web::Data<TaskStore>,
    query_params: web::Query<TaskQuery>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = store.list_tasks(user.id, &query_params).await;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// The task starts as `pending`. When `assigned_to` is omitted the creator is
/// the assignee.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: the assignee does not exist.
/// - `422 Unprocessable Entity`: validation failed.
#[post("")]
pub async fn create_task(
    sessions: web::Data<SessionManager>,
    store: web::Data<TaskStore>,
    task_data: web::Json<CreateTaskInput>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    if let Some(assignee) = task_data.assigned_to {
        ensure_assignee_exists(&sessions, assignee).await?;
    }

    let task = store.create_task(user.id, task_data.into_inner()).await;
    Ok(HttpResponse::Created().json(task))
}

#[get("/{task_id}")]
pub async fn get_task(
    store: web::Data<TaskStore>,
    task_id: web::Path<Uuid>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = store.get_task(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates a task visible to the authenticated user. Absent fields are kept.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `400 Bad Request`: the new assignee does not exist.
/// - `404 Not Found`: no such task, or the user is neither creator nor assignee.
#[put("/{task_id}")]
pub async fn update_task(
    sessions: web::Data<SessionManager>,
    store: web::Data<TaskStore>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    if let Some(assignee) = task_data.assigned_to {
        ensure_assignee_exists(&sessions, assignee).await?;
    }

    let task = store
        .update_task(user.id, task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task and its comments. Only the creator may do this.
#[delete("/{task_id}")]
pub async fn delete_task(
    store: web::Data<TaskStore>,
    task_id: web::Path<Uuid>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    store.delete_task(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Task deleted successfully"
    })))
}

#[post("/{task_id}/comments")]
pub async fn create_comment(
    store: web::Data<TaskStore>,
    task_id: web::Path<Uuid>,
    comment_data: web::Json<CommentInput>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    comment_data.validate()?;
    let comment = store
        .add_comment(user.id, task_id.into_inner(), comment_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

#[get("/{task_id}/comments")]
pub async fn get_comments(
    store: web::Data<TaskStore>,
    task_id: web::Path<Uuid>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let comments = store.list_comments(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

#[get("/{task_id}/comments/{comment_id}")]
pub async fn get_comment(
    store: web::Data<TaskStore>,
    path: web::Path<(Uuid, Uuid)>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let (task_id, comment_id) = path.into_inner();
    let comment = store.get_comment(user.id, task_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// Edits a comment. Only its author may do this.
#[put("/{task_id}/comments/{comment_id}")]
pub async fn update_comment(
    store: web::Data<TaskStore>,
    path: web::Path<(Uuid, Uuid)>,
    comment_data: web::Json<CommentInput>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    comment_data.validate()?;
    let (task_id, comment_id) = path.into_inner();
    let comment = store
        .update_comment(user.id, task_id, comment_id, comment_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

#[delete("/{task_id}/comments/{comment_id}")]
pub async fn delete_comment(
    store: web::Data<TaskStore>,
    path: web::Path<(Uuid, Uuid)>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let (task_id, comment_id) = path.into_inner();
    store.delete_comment(user.id, task_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Comment deleted successfully"
    })))
}
