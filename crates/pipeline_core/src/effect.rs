use std::time::Duration;

use crate::{ConfirmRequest, JobStatus, Segment, SegmentationRequest, TaskId};

/// Identifies one poll session. Never reused within a poller.
pub type SessionId = u64;
/// Identifies one scheduled re-poll.
pub type TimerTicket = u64;
/// Identifies one segmentation run.
pub type RunId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchStatus {
        session: SessionId,
        task_id: TaskId,
    },
    SchedulePoll {
        ticket: TimerTicket,
        delay: Duration,
    },
    CancelPoll {
        ticket: TimerTicket,
    },
    RequestSegmentation {
        run: RunId,
        request: SegmentationRequest,
    },
    ConfirmResults {
        request: ConfirmRequest,
    },
    /// Surface a lifecycle event to the embedding application.
    Notify(Notification),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PollingStarted { task_id: TaskId },
    StatusUpdated { task_id: TaskId, status: JobStatus },
    JobCompleted { task_id: TaskId, status: JobStatus },
    JobFailed { task_id: TaskId, status: JobStatus },
    /// Transport failure while fetching status; the session is already halted.
    StatusFetchFailed { task_id: TaskId, error: String },
    PollingStopped { task_id: TaskId },
    SegmentationStarted,
    SegmentationCompleted { segment_count: usize },
    SegmentationFailed { error: String },
    /// Full snapshot of the working collection after a change.
    SegmentsChanged(Vec<Segment>),
    ResultsConfirmed { result_path: String },
    ConfirmFailed { error: String },
}
