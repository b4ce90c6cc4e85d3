use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub comment_id: Uuid,
    pub task_id: Uuid,
    /// Author of the comment.
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of both comment creation and comment edits.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

impl Comment {
    pub fn new(task_id: Uuid, author: Uuid, input: CommentInput) -> Self {
        let now = Utc::now();
        Self {
            comment_id: Uuid::new_v4(),
            task_id,
            user_id: author,
            content: input.content,
            created_at: now,
            updated_at: now,
        }
    }
}
