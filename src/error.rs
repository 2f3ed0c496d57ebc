use std::path::PathBuf;

use thiserror::Error;

use crate::bank::{OptionKey, QuestionId};

/// Failure to produce a usable question bank. Always terminal for the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no bundled question bank named '{0}'")]
    UnknownBundled(String),

    #[error("malformed question bank: {0}")]
    Malformed(String),

    #[error("question bank has no questions")]
    Empty,
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Malformed(e.to_string())
    }
}

/// Rejections raised by session operations.
///
/// `AlreadyAnswered`, `NoMistakes` and `InvalidOption` are informational: the
/// shell reports them and carries on. `NotFound` means an answer references a
/// question the bank does not contain, which is a consistency bug.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("question already answered")]
    AlreadyAnswered,

    #[error("no mistakes to review")]
    NoMistakes,

    #[error("option {key} is not offered by question {question}")]
    InvalidOption { question: QuestionId, key: OptionKey },

    #[error("no quiz in progress")]
    NotInProgress,

    #[error("question {0} not found")]
    NotFound(QuestionId),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no mistakes to export")]
    NoMistakes,

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode csv: {0}")]
    Csv(#[from] csv::Error),
}
