use pipeline_core::{JobStatus, PipelineStep, StepState, TaskStatus};

fn job(status: &str) -> JobStatus {
    JobStatus::new("job", TaskStatus::parse(status))
}

#[test]
fn happy_path_progress_is_non_decreasing_and_ends_at_100() {
    let sequence = [
        "pending",
        "uploading",
        "processing_ocr",
        "cleaning",
        "processing_rag",
        "completed",
    ];
    let percents: Vec<u8> = sequence
        .iter()
        .map(|status| job(status).progress_percent())
        .collect();

    assert_eq!(percents, vec![0, 20, 40, 60, 80, 100]);
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn reported_progress_wins_and_is_clamped() {
    assert_eq!(job("cleaning").with_progress(73.4).progress_percent(), 73);
    assert_eq!(job("cleaning").with_progress(180.0).progress_percent(), 100);
    assert_eq!(job("cleaning").with_progress(-5.0).progress_percent(), 0);
}

#[test]
fn processing_is_an_alias_for_ocr_and_unknown_maps_to_pending() {
    assert_eq!(job("processing").current_step(), PipelineStep::ProcessingOcr);
    assert_eq!(job("processing").progress_percent(), 40);
    assert_eq!(job("mystery").current_step(), PipelineStep::Pending);
    assert_eq!(job("mystery").progress_percent(), 0);
}

#[test]
fn steps_before_the_current_one_are_completed() {
    let status = job("cleaning");
    let states: Vec<StepState> = PipelineStep::ALL
        .iter()
        .map(|&step| status.step_state(step))
        .collect();

    assert_eq!(
        states,
        vec![
            StepState::Completed,
            StepState::Completed,
            StepState::Completed,
            StepState::Active,
            StepState::Pending,
            StepState::Pending,
            StepState::Pending,
        ]
    );
}

#[test]
fn failed_status_completes_nothing_and_flags_the_current_step() {
    let status = job("failed");
    for step in PipelineStep::ALL {
        let expected = if step == PipelineStep::Failed {
            StepState::Failed
        } else {
            StepState::Pending
        };
        assert_eq!(status.step_state(step), expected, "step {step:?}");
    }
    assert_eq!(status.progress_percent(), 100);
    assert!(status.status.is_terminal());
}
