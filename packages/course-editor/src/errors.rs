//! Error types for the course editor

use crate::ids::EntityId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Submission failed: {0}")]
    Submit(#[from] SubmitError),
}

/// Failure reported by the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend rejected change {entry_id}: {reason}")]
    Rejected { entry_id: String, reason: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),
}
