//! Pipeline core: pure state machine for job polling and segment editing.
mod editor;
mod effect;
mod msg;
mod poller;
mod segment;
mod state;
mod status;
mod update;
mod view_model;

pub use editor::{EditorState, SegmentationRun, NEW_SEGMENT_PLACEHOLDER};
pub use effect::{Effect, Notification, RunId, SessionId, TimerTicket};
pub use msg::Msg;
pub use poller::{PollSession, PollerConfig, PollerState, DEFAULT_POLL_INTERVAL};
pub use segment::{
    ConfirmRequest, IncomingSegment, Segment, SegmentId, SegmentMetadata, SegmentationOptions,
    SegmentationPhase, SegmentationRequest, DEFAULT_CONFIDENCE,
};
pub use state::AppState;
pub use status::{format_elapsed, JobStatus, PipelineStep, StepState, TaskId, TaskStatus};
pub use update::update;
pub use view_model::{AppViewModel, EditorView, PollerView, SegmentRowView, StepView};
