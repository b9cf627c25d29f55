//! REST response envelope: `{status, data, message?, errors?}`.

use crate::error::EnvelopeError;
use crate::team::{TeamDetail, TeamStanding};
use serde::{Deserialize, Serialize};

/// Message used when an error envelope carries no `message` of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Per-field validation message attached to an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: EnvelopeStatus,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: Some(data),
            message: None,
            errors: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            data: None,
            message: Some(message.into()),
            errors: Vec::new(),
        }
    }

    /// Unwrap the payload, turning `status: "error"` into an error that
    /// carries the server's message verbatim.
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        match self.status {
            EnvelopeStatus::Error => Err(EnvelopeError::Failed {
                message: self
                    .message
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
                errors: self.errors,
            }),
            EnvelopeStatus::Success => self.data.ok_or(EnvelopeError::MissingData),
        }
    }
}

/// `data` of `GET /leaderboard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardPayload {
    pub leaderboard: Vec<TeamStanding>,
}

/// `data` of `GET /teams/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPayload {
    pub team: TeamDetail,
}
