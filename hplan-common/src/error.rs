//! Common error types for Hausplaner

use thiserror::Error;

/// Common result type for Hausplaner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Hausplaner crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input (unknown question id, rating outside 1..=5, empty address)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Action not permitted in the current workflow state
    #[error("Action '{action}' not allowed in state {state}")]
    InvalidTransition { state: String, action: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for building an `InvalidTransition` from anything displayable
    pub fn invalid_transition(state: impl std::fmt::Display, action: impl Into<String>) -> Self {
        Error::InvalidTransition {
            state: state.to_string(),
            action: action.into(),
        }
    }
}
