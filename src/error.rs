//! Error types for value trees and the model store.

use crate::types::NodeId;
use thiserror::Error;

/// Main error type for node and store operations.
#[derive(Debug, Error)]
pub enum ValuableError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Node destroyed: {0}")]
    Destroyed(NodeId),

    #[error("Notification depth limit reached ({0})")]
    ReentrancyLimit(usize),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<serde_json::Error> for ValuableError {
    fn from(e: serde_json::Error) -> Self {
        ValuableError::InvalidArgument(e.to_string())
    }
}

/// Result type for node and store operations.
pub type Result<T> = std::result::Result<T, ValuableError>;
