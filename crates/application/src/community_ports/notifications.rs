use chrono::{DateTime, Utc};

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Confirms a completed action.
    Success,
    /// Reports a failed action the user can retry.
    Error,
}

/// User-visible message raised by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Notice severity.
    pub kind: NoticeKind,
    /// Short headline.
    pub title: String,
    /// Longer explanation.
    pub description: String,
    /// When the notice was raised.
    pub emitted_at: DateTime<Utc>,
}

impl Notice {
    /// Creates a success notice stamped with the current time.
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, title, description)
    }

    /// Creates an error notice stamped with the current time.
    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, title, description)
    }

    fn new(kind: NoticeKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            emitted_at: Utc::now(),
        }
    }
}

/// Port for delivering notices to the user.
pub trait UserNotifier: Send + Sync {
    /// Delivers one notice.
    fn notify(&self, notice: Notice);
}
