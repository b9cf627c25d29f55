//! Error types for payload validation and envelope decoding.

use crate::envelope::FieldError;
use crate::team::TeamId;
use thiserror::Error;

/// A pushed or pulled payload could not be turned into a snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Malformed snapshot payload: {reason}")]
    Malformed { reason: String },

    #[error("Team {team_id} has invalid rank 0 (ranks start at 1)")]
    InvalidRank { team_id: TeamId },
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed {
            reason: err.to_string(),
        }
    }
}

/// The API answered with an error envelope, or a success envelope without data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("{message}")]
    Failed {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Response envelope is missing its data field")]
    MissingData,
}

impl EnvelopeError {
    /// Server-supplied message (or the generic fallback).
    pub fn message(&self) -> &str {
        match self {
            Self::Failed { message, .. } => message,
            Self::MissingData => "Response envelope is missing its data field",
        }
    }
}
