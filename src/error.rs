//! Error type for construction and parsing failures.
//!
//! Move legality is never reported through this type: `is_legal` and friends
//! return `bool` so the search loop stays allocation-free.

use thiserror::Error;

/// Errors raised while building boards or parsing text input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Requested board dimensions are outside `0..=MAX_LEN`
    #[error("invalid board size {x_size}x{y_size} (max {max})")]
    InvalidBoardSize { x_size: usize, y_size: usize, max: usize },

    /// Board text could not be parsed
    #[error("could not parse board: {0}")]
    BoardText(String),

    /// A location string was malformed or off the board
    #[error("could not parse board location: {0}")]
    Location(String),

    /// A player string was not recognised
    #[error("could not parse player: {0}")]
    Player(String),

    /// Rules text was malformed
    #[error("could not parse rules: {0}")]
    Rules(String),

    /// A rules JSON object named a key we do not understand
    #[error("unknown rules option: {0}")]
    UnknownRuleKey(String),

    /// Komi out of range or not a multiple of 0.5
    #[error("komi value is not a half-integer or is too extreme: {0}")]
    Komi(String),

    /// Malformed JSON snapshot
    #[error("invalid json: {0}")]
    Json(String),

    /// An internal invariant check failed
    #[error("board inconsistency: {0}")]
    Inconsistent(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
