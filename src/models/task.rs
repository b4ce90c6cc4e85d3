use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Represents the status of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Pending,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Completed,
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskInput {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// An optional description for the task.
    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Assignee. Defaults to the creator.
    pub assigned_to: Option<Uuid>,
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
}

/// Represents a task entity as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub task_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Identifier of the user who created the task.
    pub created_by: Uuid,
    /// Identifier of the user responsible for the task.
    pub assigned_to: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for filtering tasks when listing them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
}

impl Task {
    /// Creates a pending task owned by `creator`.
    /// Unless an assignee is given, the creator is also the assignee.
    pub fn new(input: CreateTaskInput, creator: Uuid) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: TaskStatus::Pending,
            created_by: creator,
            assigned_to: input.assigned_to.unwrap_or(creator),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creator and assignee may see and edit a task.
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.created_by == user_id || self.assigned_to == user_id
    }

    pub fn apply(&mut self, changes: UpdateTaskInput) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(assigned_to) = changes.assigned_to {
            self.assigned_to = assigned_to;
        }
        self.updated_at = Utc::now();
    }
}
