#![doc = "The `taskforge` library crate."]
#![doc = ""]
#![doc = "This crate contains the session core (password verification, bearer tokens,"]
#![doc = "logout by token blacklist, request authorization), the user directory, the"]
#![doc = "task and comment store, routing configuration, and error handling for the"]
#![doc = "TaskForge API. It is used by the main binary (`main.rs`) to build and run the server."]

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod notification;
pub mod routes;
pub mod tasks;

// The App itself is assembled in main.rs and in the integration tests; actix's
// App type does not name well as a return value from a library function.

pub use crate::auth::SessionManager;
pub use crate::error::{AppError, AuthError};
