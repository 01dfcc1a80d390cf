//! Lesson domain errors

use thiserror::Error;
use unilearn_store::StoreError;

#[derive(Debug, Error)]
pub enum LessonError {
    #[error("invalid lesson input: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("student is already enrolled in this lesson")]
    AlreadyEnrolled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LessonError {
    /// Fixed user-facing message key, resolved through the translation
    /// catalog; `None` means the raw message is shown verbatim.
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            LessonError::AlreadyEnrolled => Some("lessons.alreadyEnrolled"),
            LessonError::Store(StoreError::NotFound) => Some("lessons.notFound"),
            LessonError::Store(StoreError::Transport(_)) => Some("auth.networkError"),
            _ => None,
        }
    }
}
