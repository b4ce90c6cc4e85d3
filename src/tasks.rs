//! In-memory task and comment storage with the ownership rules of the API.
//!
//! A task is visible to its creator and its assignee. Only the creator may
//! delete it. Comments follow their task's visibility and may only be edited or
//! deleted by their author. Tasks the actor cannot see are reported as not found.

use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Comment, CommentInput, CreateTaskInput, Task, TaskQuery, UpdateTaskInput};

#[derive(Default)]
struct Tables {
    tasks: HashMap<Uuid, Task>,
    comments: HashMap<Uuid, Comment>,
}

#[derive(Default)]
pub struct TaskStore {
    tables: RwLock<Tables>,
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".into())
}

impl Tables {
    fn visible_task(&self, actor: Uuid, task_id: Uuid) -> Result<&Task, AppError> {
        self.tasks
            .get(&task_id)
            .filter(|t| t.is_visible_to(actor))
            .ok_or_else(task_not_found)
    }

    fn comment(&self, task_id: Uuid, comment_id: Uuid) -> Result<&Comment, AppError> {
        self.comments
            .get(&comment_id)
            .filter(|c| c.task_id == task_id)
            .ok_or_else(comment_not_found)
    }

    fn comment_of_task(&mut self, task_id: Uuid, comment_id: Uuid) -> Result<&mut Comment, AppError> {
        self.comments
            .get_mut(&comment_id)
            .filter(|c| c.task_id == task_id)
            .ok_or_else(comment_not_found)
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_task(&self, actor: Uuid, input: CreateTaskInput) -> Task {
        let task = Task::new(input, actor);
        let mut tables = self.tables.write().await;
        tables.tasks.insert(task.task_id, task.clone());
        log::debug!("task {} created by {}", task.task_id, actor);
        task
    }

    /// Tasks the actor created or is assigned to, newest first.
    pub async fn list_tasks(&self, actor: Uuid, query: &TaskQuery) -> Vec<Task> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| t.is_visible_to(actor))
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .filter(|t| query.assigned_to.map_or(true, |a| t.assigned_to == a))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    pub async fn get_task(&self, actor: Uuid, task_id: Uuid) -> Result<Task, AppError> {
        let tables = self.tables.read().await;
        tables.visible_task(actor, task_id).cloned()
    }

    pub async fn update_task(
        &self,
        actor: Uuid,
        task_id: Uuid,
        changes: UpdateTaskInput,
    ) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        tables.visible_task(actor, task_id)?;

        let task = tables.tasks.get_mut(&task_id).ok_or_else(task_not_found)?;
        task.apply(changes);
        Ok(task.clone())
    }

    /// Removes a task and its comments. Creator only.
    pub async fn delete_task(&self, actor: Uuid, task_id: Uuid) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        if tables.visible_task(actor, task_id)?.created_by != actor {
            return Err(AppError::Forbidden("Only the creator can delete a task".into()));
        }

        let task = tables.tasks.remove(&task_id).ok_or_else(task_not_found)?;
        tables.comments.retain(|_, c| c.task_id != task_id);
        Ok(task)
    }

    pub async fn add_comment(
        &self,
        actor: Uuid,
        task_id: Uuid,
        input: CommentInput,
    ) -> Result<Comment, AppError> {
        let mut tables = self.tables.write().await;
        tables.visible_task(actor, task_id)?;

        let comment = Comment::new(task_id, actor, input);
        tables.comments.insert(comment.comment_id, comment.clone());
        Ok(comment)
    }

    /// Comments of a task, oldest first.
    pub async fn list_comments(&self, actor: Uuid, task_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let tables = self.tables.read().await;
        tables.visible_task(actor, task_id)?;

        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    pub async fn get_comment(
        &self,
        actor: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, AppError> {
        let tables = self.tables.read().await;
        tables.visible_task(actor, task_id)?;
        tables.comment(task_id, comment_id).cloned()
    }

    pub async fn update_comment(
        &self,
        actor: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
        input: CommentInput,
    ) -> Result<Comment, AppError> {
        let mut tables = self.tables.write().await;
        tables.visible_task(actor, task_id)?;

        let comment = tables.comment_of_task(task_id, comment_id)?;
        if comment.user_id != actor {
            return Err(AppError::Forbidden("Only the author can edit a comment".into()));
        }
        comment.content = input.content;
        comment.updated_at = chrono::Utc::now();
        Ok(comment.clone())
    }

    pub async fn delete_comment(
        &self,
        actor: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, AppError> {
        let mut tables = self.tables.write().await;
        tables.visible_task(actor, task_id)?;

        if tables.comment(task_id, comment_id)?.user_id != actor {
            return Err(AppError::Forbidden("Only the author can delete a comment".into()));
        }
        tables.comments.remove(&comment_id).ok_or_else(comment_not_found)
    }
}
