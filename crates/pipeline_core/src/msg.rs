use std::time::Instant;

use crate::{
    IncomingSegment, JobStatus, RunId, Segment, SegmentId, SegmentationOptions,
    SegmentationPhase, SessionId, TaskId, TimerTicket,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Start polling `task_id`. Ignored for an empty id or the id already being polled.
    BeginPolling {
        task_id: TaskId,
        started_at: Instant,
    },
    /// Stop polling. Also sent by the host before teardown.
    HaltPolling,
    /// The application handed the poller a different job id (or none).
    JobIdChanged {
        task_id: Option<TaskId>,
        started_at: Instant,
    },
    /// User clicked Refresh.
    RefreshClicked,
    /// A scheduled re-poll elapsed.
    PollTimerFired { ticket: TimerTicket },
    /// Engine finished a status fetch.
    StatusReceived {
        session: SessionId,
        result: Result<JobStatus, String>,
    },

    /// Replace the working collection with a copy of `segments`.
    ReplaceSegments(Vec<Segment>),
    /// User edited a segment's text.
    SegmentEdited { id: SegmentId, content: String },
    /// User deleted a segment.
    SegmentRemoved { id: SegmentId },
    /// User clicked "add segment".
    SegmentAppended,
    /// Merge the given segments into the first of them (in collection order).
    MergeSegments { ids: Vec<SegmentId> },
    /// User put a segment into edit mode.
    EditStarted { id: SegmentId },
    /// User left edit mode.
    EditFinished,
    /// User toggled a segment's checkbox.
    SelectionToggled { id: SegmentId },
    SelectionCleared,
    /// User asked for a fresh segmentation of `source_text`.
    SegmentationRequested {
        source_text: String,
        file_id: Option<String>,
        options: SegmentationOptions,
    },
    /// Engine moved an outstanding run to the next illustrative phase.
    SegmentationProgress {
        run: RunId,
        phase: SegmentationPhase,
    },
    /// Engine finished a segmentation call.
    SegmentationFinished {
        run: RunId,
        result: Result<Vec<IncomingSegment>, String>,
    },
    /// User confirmed the reviewed segments.
    ConfirmClicked { source_text: String },
    /// Engine finished the confirm call.
    ConfirmFinished { result: Result<String, String> },

    /// UI/render tick used to refresh the elapsed-time label.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
