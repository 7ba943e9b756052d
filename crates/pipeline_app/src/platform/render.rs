use pipeline_core::{AppViewModel, EditorView, Notification, PollerView, StepState};

/// Preview length for segment rows.
const PREVIEW_CHARS: usize = 60;

pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(line) = render_poller(&view.poller) {
        lines.push(line);
    }
    lines.extend(render_editor(&view.editor));
    lines
}

fn render_poller(view: &PollerView) -> Option<String> {
    let task_id = view.task_id.as_deref()?;

    let steps = view
        .steps
        .iter()
        .map(|row| {
            let marker = match row.state {
                StepState::Pending => ' ',
                StepState::Active => '>',
                StepState::Completed => 'x',
                StepState::Failed => '!',
            };
            format!("[{}] {}", marker, row.step.label())
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut line = format!(
        "Task {} | {} | {:>3}% | {}",
        task_id,
        view.status_label.as_deref().unwrap_or("waiting"),
        view.progress_percent,
        steps
    );
    if let Some(elapsed) = &view.elapsed {
        line.push_str(&format!(" | {}", elapsed));
    }
    if let Some(message) = &view.message {
        line.push_str(&format!(" | {}", message));
    }
    if let Some(error) = &view.error {
        line.push_str(&format!(" | error: {}", error));
    }
    if view.show_controls && !view.polling {
        line.push_str(" | stopped");
    }
    Some(line)
}

fn render_editor(view: &EditorView) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(phase) = view.segmentation_phase {
        lines.push(format!("Segmentation: {}...", phase.label()));
    }
    if view.confirming {
        lines.push("Confirming results...".to_string());
    }
    if view.segments.is_empty() {
        return lines;
    }

    lines.push(format!(
        "Segments: {} | Characters: {}",
        view.segment_count, view.total_characters
    ));
    for row in &view.segments {
        let confidence = row
            .metadata
            .confidence
            .map(|value| format!(" conf {:.2}", value))
            .unwrap_or_default();
        lines.push(format!(
            "  #{:<3} [{}] {} chars{} | {}",
            row.chunk_index + 1,
            row.id,
            row.char_count,
            confidence,
            preview(&row.content)
        ));
    }
    lines
}

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

/// Human-readable text for notifications that need the user's attention.
pub fn describe_notification(notification: &Notification) -> Option<String> {
    match notification {
        Notification::JobCompleted { task_id, .. } => {
            Some(format!("Task {} completed.", task_id))
        }
        Notification::JobFailed { task_id, status } => Some(format!(
            "Task {} failed: {}",
            task_id,
            status
                .error
                .as_deref()
                .or(status.message.as_deref())
                .unwrap_or("no details")
        )),
        Notification::StatusFetchFailed { task_id, error } => Some(format!(
            "Could not fetch status for task {}: {}",
            task_id, error
        )),
        Notification::SegmentationCompleted { segment_count } => {
            Some(format!("Segmentation produced {} segments.", segment_count))
        }
        Notification::SegmentationFailed { error } => {
            Some(format!("Segmentation failed: {}", error))
        }
        Notification::ResultsConfirmed { result_path } => {
            Some(format!("Results saved to {}.", result_path))
        }
        Notification::ConfirmFailed { error } => {
            Some(format!("Saving results failed: {}", error))
        }
        Notification::PollingStarted { .. }
        | Notification::StatusUpdated { .. }
        | Notification::PollingStopped { .. }
        | Notification::SegmentationStarted
        | Notification::SegmentsChanged(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::{JobStatus, TaskStatus};

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("a\n  b"), "a b");
        let long = "x".repeat(PREVIEW_CHARS + 5);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn failed_job_prefers_error_text() {
        let mut status = JobStatus::new("t1", TaskStatus::Failed);
        status.error = Some("ocr engine crashed".to_string());
        status.message = Some("step 2".to_string());

        let text = describe_notification(&Notification::JobFailed {
            task_id: "t1".to_string(),
            status,
        });
        assert_eq!(text.as_deref(), Some("Task t1 failed: ocr engine crashed"));
    }

    #[test]
    fn idle_view_renders_nothing() {
        assert!(render(&AppViewModel::default()).is_empty());
    }
}
