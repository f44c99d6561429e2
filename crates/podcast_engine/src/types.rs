use std::fmt;

use podcast_core::{StatusReport, TaskStatus};
use serde::Deserialize;
use thiserror::Error;

/// Body of `POST /create-podcast`.
#[derive(Debug, Deserialize)]
pub(crate) struct CreateTaskResponse {
    pub task_id: String,
}

/// Body of `GET /podcast_status/{task_id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    pub status: WireStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WireStatus {
    Queued,
    #[serde(alias = "processing")]
    Running,
    Completed,
    Failed,
}

impl From<StatusResponse> for StatusReport {
    fn from(response: StatusResponse) -> Self {
        let status = match response.status {
            WireStatus::Queued => TaskStatus::Queued,
            WireStatus::Running => TaskStatus::Running,
            WireStatus::Completed => TaskStatus::Completed,
            WireStatus::Failed => TaskStatus::Failed,
        };
        StatusReport {
            status,
            progress: response.progress.filter(|p| p.is_finite()),
            message: response.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
        }
    }
}
