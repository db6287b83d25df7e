use std::path::PathBuf;
use thiserror::Error;

/// Reasons a title or due date is unacceptable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title required")]
    TitleRequired,
    #[error("due date in the past")]
    DueDateInPast,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("task {0} not found")]
    NotFound(u32),
    #[error("task id {0} appears more than once")]
    DuplicateId(u32),
    #[error("no task ids left to assign")]
    IdsExhausted,
    #[error("failed to serialize tasks")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write task store at {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn validation(&self) -> Option<ValidationError> {
        match self {
            Error::Validation(reason) => Some(*reason),
            _ => None,
        }
    }
}
