use std::fmt;

use pipeline_core::{IncomingSegment, JobStatus, RunId, SegmentationPhase, SessionId, TimerTicket};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StatusFetched {
        session: SessionId,
        result: Result<JobStatus, ApiError>,
    },
    TimerFired {
        ticket: TimerTicket,
    },
    SegmentationProgress {
        run: RunId,
        phase: SegmentationPhase,
    },
    SegmentationCompleted {
        run: RunId,
        result: Result<Vec<IncomingSegment>, ApiError>,
    },
    ConfirmCompleted {
        result: Result<String, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
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
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build api client: {0}")]
    Client(#[from] ApiError),
}
