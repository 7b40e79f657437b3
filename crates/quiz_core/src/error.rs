use crate::state::Phase;
use thiserror::Error;

/// Errors raised while loading question data.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate player id: {0}")]
    DuplicatePlayer(String),

    #[error("Player {player} has a negative question value or increment")]
    NegativeAmount { player: String },

    #[error("Question {question} targets unknown player {target}")]
    UnknownTarget { question: String, target: String },

    #[error("Duplicate question id {question} for player {player}")]
    DuplicateQuestion { player: String, question: String },

    #[error("Question {question} has no options")]
    NoOptions { question: String },

    #[error("Question {question}: correct answer {answer} is not one of its options")]
    MissingCorrectAnswer { question: String, answer: String },

    #[error("Question {question} has a non-finite difficulty")]
    InvalidDifficulty { question: String },
}

/// Errors surfaced by game operations.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Invalid transition: {event} is not allowed in phase {phase:?}")]
    InvalidTransition { phase: Phase, event: &'static str },

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("Unknown option {key} for question {question}")]
    UnknownOption { question: String, key: String },

    #[error("Question data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(u8),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuizError {
    /// Rejections leave the session untouched; the caller can simply ignore them.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            QuizError::InvalidTransition { .. }
                | QuizError::UnknownPlayer(_)
                | QuizError::UnknownOption { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
