pub mod comment;
pub mod task;
pub mod user;

pub use comment::{Comment, CommentInput};
pub use task::{CreateTaskInput, Task, TaskQuery, TaskStatus, UpdateTaskInput};
pub use user::{CreateUserInput, CredentialRecord, Identity, NewUser, UpdateUserInput, UserChanges};
