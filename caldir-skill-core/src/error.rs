//! Error types for the event creation skill.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while turning an utterance into a stored event.
#[derive(Error, Debug)]
pub enum SkillError {
    #[error("No date or time could be found")]
    NoDateTimeFound,

    #[error("Event description is empty")]
    EmptyDescription,

    #[error("No answer to required prompt '{0}'")]
    DialogueAborted(&'static str),

    #[error("Could not access calendar store at {}: {source}", path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown locale '{0}'")]
    UnknownLocale(String),

    #[error("Unknown time zone '{0}'")]
    UnknownTimezone(String),
}

impl SkillError {
    /// Errors the creation flow answers with "could not understand" instead
    /// of failing the whole request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SkillError::NoDateTimeFound
                | SkillError::EmptyDescription
                | SkillError::DialogueAborted(_)
        )
    }

    pub(crate) fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SkillError::StoreIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for skill operations.
pub type SkillResult<T> = Result<T, SkillError>;
