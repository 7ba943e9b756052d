use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::BeginPolling {
            task_id,
            started_at,
        } => state.poller.begin(task_id, started_at),
        Msg::HaltPolling => state.poller.halt(),
        Msg::JobIdChanged {
            task_id,
            started_at,
        } => state.poller.job_id_changed(task_id, started_at),
        Msg::RefreshClicked => state.poller.refresh(),
        Msg::PollTimerFired { ticket } => state.poller.timer_fired(ticket),
        Msg::StatusReceived { session, result } => state.poller.status_received(session, result),

        Msg::ReplaceSegments(segments) => state.editor.replace_all(segments),
        Msg::SegmentEdited { id, content } => state.editor.update_content(&id, content),
        Msg::SegmentRemoved { id } => state.editor.remove(&id),
        Msg::SegmentAppended => state.editor.append(),
        Msg::MergeSegments { ids } => state.editor.merge(&ids),
        Msg::EditStarted { id } => {
            if state.editor.begin_edit(id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::EditFinished => {
            if state.editor.finish_edit() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectionToggled { id } => {
            if state.editor.toggle_selection(id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectionCleared => {
            if state.editor.clear_selection() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SegmentationRequested {
            source_text,
            file_id,
            options,
        } => state
            .editor
            .request_segmentation(source_text, file_id, options),
        Msg::SegmentationProgress { run, phase } => {
            if state.editor.segmentation_progress(run, phase) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SegmentationFinished { run, result } => {
            state.editor.segmentation_finished(run, result)
        }
        Msg::ConfirmClicked { source_text } => state.editor.confirm(source_text),
        Msg::ConfirmFinished { result } => state.editor.confirm_finished(result),

        // The elapsed label changes with time alone while a session runs.
        Msg::Tick => {
            if state.poller.is_polling() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    if !effects.is_empty() {
        state.mark_dirty();
    }
    (state, effects)
}
