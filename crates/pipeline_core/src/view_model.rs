use crate::{PipelineStep, SegmentId, SegmentMetadata, SegmentationPhase, StepState};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub poller: PollerView,
    pub editor: EditorView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollerView {
    pub task_id: Option<String>,
    pub polling: bool,
    pub show_controls: bool,
    /// Raw backend status, e.g. `processing_ocr`.
    pub status_label: Option<String>,
    pub progress_percent: u8,
    pub current_step: Option<PipelineStep>,
    pub steps: Vec<StepView>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub elapsed: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepView {
    pub step: PipelineStep,
    pub state: StepState,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorView {
    pub segments: Vec<SegmentRowView>,
    pub segment_count: usize,
    pub total_characters: usize,
    pub segmentation_phase: Option<SegmentationPhase>,
    pub confirming: bool,
    pub can_merge: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRowView {
    pub id: SegmentId,
    pub chunk_index: usize,
    pub content: String,
    pub char_count: usize,
    pub metadata: SegmentMetadata,
    pub editing: bool,
    pub selected: bool,
}
