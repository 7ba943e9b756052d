use std::fmt;
use std::time::Duration;

pub type TaskId = String;

/// Raw job status as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Uploading,
    Processing,
    ProcessingOcr,
    Cleaning,
    ProcessingRag,
    Completed,
    Failed,
    Unknown(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "pending" => Self::Pending,
            "uploading" => Self::Uploading,
            "processing" => Self::Processing,
            "processing_ocr" => Self::ProcessingOcr,
            "cleaning" => Self::Cleaning,
            "processing_rag" => Self::ProcessingRag,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::ProcessingOcr => "processing_ocr",
            Self::Cleaning => "cleaning",
            Self::ProcessingRag => "processing_rag",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Projects the status onto the fixed step sequence.
    ///
    /// `processing` is an alias of `processing_ocr`; anything unrecognised
    /// shows as `pending`.
    pub fn step(&self) -> PipelineStep {
        match self {
            Self::Pending | Self::Unknown(_) => PipelineStep::Pending,
            Self::Uploading => PipelineStep::Uploading,
            Self::Processing | Self::ProcessingOcr => PipelineStep::ProcessingOcr,
            Self::Cleaning => PipelineStep::Cleaning,
            Self::ProcessingRag => PipelineStep::ProcessingRag,
            Self::Completed => PipelineStep::Completed,
            Self::Failed => PipelineStep::Failed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the pipeline as shown to the user, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStep {
    Pending,
    Uploading,
    ProcessingOcr,
    Cleaning,
    ProcessingRag,
    Completed,
    Failed,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 7] = [
        PipelineStep::Pending,
        PipelineStep::Uploading,
        PipelineStep::ProcessingOcr,
        PipelineStep::Cleaning,
        PipelineStep::ProcessingRag,
        PipelineStep::Completed,
        PipelineStep::Failed,
    ];

    pub fn position(self) -> usize {
        self as usize
    }

    /// Fallback percentage used when the backend omits `progress`.
    pub fn nominal_progress(self) -> u8 {
        match self {
            PipelineStep::Pending => 0,
            PipelineStep::Uploading => 20,
            PipelineStep::ProcessingOcr => 40,
            PipelineStep::Cleaning => 60,
            PipelineStep::ProcessingRag => 80,
            PipelineStep::Completed | PipelineStep::Failed => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStep::Pending => "Pending",
            PipelineStep::Uploading => "Uploading",
            PipelineStep::ProcessingOcr => "OCR",
            PipelineStep::Cleaning => "Cleaning",
            PipelineStep::ProcessingRag => "Segmenting",
            PipelineStep::Completed => "Completed",
            PipelineStep::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Active,
    Completed,
    Failed,
}

/// Latest status payload for a job, already decoded by the engine.
///
/// `message`, `error` and the timestamps are advisory and only displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl JobStatus {
    pub fn new(task_id: impl Into<TaskId>, status: TaskStatus) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            progress: None,
            message: None,
            error: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn current_step(&self) -> PipelineStep {
        self.status.step()
    }

    /// Reported progress clamped to `[0, 100]`, or the nominal value for the step.
    pub fn progress_percent(&self) -> u8 {
        match self.progress {
            Some(value) if value.is_finite() => value.clamp(0.0, 100.0).round() as u8,
            _ => self.current_step().nominal_progress(),
        }
    }

    pub fn step_state(&self, step: PipelineStep) -> StepState {
        let current = self.current_step();
        let failed = self.status == TaskStatus::Failed;
        if step == current {
            if failed {
                StepState::Failed
            } else {
                StepState::Active
            }
        } else if !failed && step.position() < current.position() {
            StepState::Completed
        } else {
            StepState::Pending
        }
    }
}

/// Formats an elapsed duration as `Ns`, or `Nm Ns` above one minute.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs > 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_keeps_raw_label() {
        let status = TaskStatus::parse("queued_for_gpu");
        assert_eq!(status.as_str(), "queued_for_gpu");
        assert_eq!(status.step(), PipelineStep::Pending);
        assert!(!status.is_terminal());
    }

    #[test]
    fn nan_progress_falls_back_to_table() {
        let status = JobStatus::new("t", TaskStatus::Cleaning).with_progress(f64::NAN);
        assert_eq!(status.progress_percent(), 60);
    }

    #[test]
    fn elapsed_switches_to_minutes_above_sixty_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0s");
        assert_eq!(format_elapsed(Duration::from_secs(60)), "60s");
        assert_eq!(format_elapsed(Duration::from_secs(61)), "1m 1s");
        assert_eq!(format_elapsed(Duration::from_millis(125_900)), "2m 5s");
    }
}
