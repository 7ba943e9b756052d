use std::time::Instant;

use crate::editor::EditorState;
use crate::poller::{PollerConfig, PollerState};
use crate::status::format_elapsed;
use crate::view_model::{AppViewModel, EditorView, PollerView, SegmentRowView, StepView};
use crate::PipelineStep;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) poller: PollerState,
    pub(crate) editor: EditorState,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PollerConfig) -> Self {
        Self {
            poller: PollerState::new(config),
            ..Self::default()
        }
    }

    pub fn poller(&self) -> &PollerState {
        &self.poller
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// True while any background work is outstanding.
    pub fn is_busy(&self) -> bool {
        self.poller.is_polling() || self.editor.run().is_some() || self.editor.is_confirming()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Builds the view model; `now` drives the elapsed-time label.
    pub fn view_at(&self, now: Instant) -> AppViewModel {
        AppViewModel {
            poller: self.poller_view(now),
            editor: self.editor_view(),
            dirty: self.dirty,
        }
    }

    fn poller_view(&self, now: Instant) -> PollerView {
        let poller = &self.poller;
        let status = poller.last_status();
        let session = poller.session();

        let steps = PipelineStep::ALL
            .iter()
            .map(|&step| StepView {
                step,
                state: match status {
                    Some(status) => status.step_state(step),
                    None => crate::StepState::Pending,
                },
            })
            .collect();

        PollerView {
            task_id: session
                .map(|session| session.task_id.clone())
                .or_else(|| poller.assigned_task_id().map(str::to_string)),
            polling: session.is_some(),
            show_controls: poller.config().show_controls,
            status_label: status.map(|status| status.status.to_string()),
            progress_percent: status.map_or(0, |status| status.progress_percent()),
            current_step: status.map(|status| status.current_step()),
            steps,
            message: status.and_then(|status| status.message.clone()),
            error: poller
                .last_error()
                .map(str::to_string)
                .or_else(|| status.and_then(|status| status.error.clone())),
            elapsed: session
                .map(|session| format_elapsed(now.saturating_duration_since(session.started_at))),
        }
    }

    fn editor_view(&self) -> EditorView {
        let editor = &self.editor;
        let segments = editor
            .segments()
            .iter()
            .map(|segment| SegmentRowView {
                id: segment.id.clone(),
                chunk_index: segment.chunk_index,
                content: segment.content.clone(),
                char_count: segment.char_count(),
                metadata: segment.metadata.clone(),
                editing: editor.editing() == Some(&segment.id),
                selected: editor.selected().contains(&segment.id),
            })
            .collect::<Vec<_>>();

        EditorView {
            segment_count: segments.len(),
            segments,
            total_characters: editor.total_characters(),
            segmentation_phase: editor.run().map(|run| run.phase),
            confirming: editor.is_confirming(),
            can_merge: editor.selected().len() >= 2,
        }
    }
}
