//! Log-only user notifications.
//!
//! Messages are rendered from fixed templates with `{key}` placeholders and
//! written to the application log. Nothing is delivered anywhere.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    UserCreated,
    UserUpdated,
    UserDeleted,
}

impl NotificationKind {
    fn template(self) -> &'static str {
        match self {
            NotificationKind::UserCreated => "Welcome, {user_name}! Your account has been created.",
            NotificationKind::UserUpdated => "Your account details have been updated.",
            NotificationKind::UserDeleted => "Your account has been deleted. We're sorry to see you go.",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NotificationKind::UserCreated => "user_created",
            NotificationKind::UserUpdated => "user_update",
            NotificationKind::UserDeleted => "user_delete",
        };
        write!(f, "{}", name)
    }
}

/// Fills `{key}` placeholders of `template`. Unknown placeholders are kept.
pub fn render(template: &str, data: &[(&str, &str)]) -> String {
    data.iter().fold(template.to_string(), |message, (key, value)| {
        message.replace(&format!("{{{}}}", key), value)
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Notifier;

impl Notifier {
    pub fn new() -> Self {
        Notifier
    }

    /// Renders and logs a notification. Returns the rendered message.
    pub fn send(&self, to: &str, kind: NotificationKind, data: &[(&str, &str)]) -> String {
        let message = render(kind.template(), data);
        log::info!("[notification] to={} type={} {}", to, kind, message);
        message
    }
}
