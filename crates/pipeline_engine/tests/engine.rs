use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipeline_core::{
    ConfirmRequest, IncomingSegment, JobStatus, SegmentationOptions, SegmentationPhase,
    SegmentationRequest, TaskStatus,
};
use pipeline_engine::{
    ApiError, EngineEvent, EngineHandle, FailureKind, PipelineApi, SEGMENTATION_PHASE_DELAY,
};

#[derive(Default)]
struct FakeApi {
    status_calls: AtomicUsize,
    segment_delay: Duration,
}

#[async_trait::async_trait]
impl PipelineApi for FakeApi {
    async fn fetch_status(&self, task_id: &str) -> Result<JobStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if task_id == "broken" {
            return Err(ApiError {
                kind: FailureKind::Network,
                message: "connection refused".to_string(),
            });
        }
        Ok(JobStatus::new(task_id, TaskStatus::Cleaning))
    }

    async fn segment(
        &self,
        request: &SegmentationRequest,
    ) -> Result<Vec<IncomingSegment>, ApiError> {
        tokio::time::sleep(self.segment_delay).await;
        Ok(request
            .content
            .split_whitespace()
            .map(IncomingSegment::new)
            .collect())
    }

    async fn confirm(&self, _request: &ConfirmRequest) -> Result<String, ApiError> {
        Ok("saved.json".to_string())
    }
}

fn engine(api: FakeApi) -> EngineHandle {
    EngineHandle::with_api(Arc::new(api)).expect("engine")
}

fn collect_for(engine: &EngineHandle, window: Duration) -> Vec<EngineEvent> {
    let deadline = std::time::Instant::now() + window;
    let mut events = Vec::new();
    while let Some(remaining) = deadline.checked_duration_since(std::time::Instant::now()) {
        match engine.recv_timeout(remaining) {
            Some(event) => events.push(event),
            None => break,
        }
    }
    events
}

#[test]
fn status_results_are_tagged_with_the_session() {
    let engine = engine(FakeApi::default());
    engine.fetch_status(7, "job-1");
    engine.fetch_status(8, "broken");

    let mut events = collect_for(&engine, Duration::from_millis(500));
    events.sort_by_key(|event| match event {
        EngineEvent::StatusFetched { session, .. } => *session,
        _ => 0,
    });

    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        EngineEvent::StatusFetched { session: 7, result: Ok(status) } if status.task_id == "job-1"
    ));
    assert!(matches!(
        &events[1],
        EngineEvent::StatusFetched { session: 8, result: Err(err) }
            if err.kind == FailureKind::Network
    ));
}

#[test]
fn scheduled_poll_fires_once() {
    let engine = engine(FakeApi::default());
    engine.schedule_poll(3, Duration::from_millis(20));

    let events = collect_for(&engine, Duration::from_millis(300));
    assert_eq!(events, vec![EngineEvent::TimerFired { ticket: 3 }]);
}

#[test]
fn cancelled_poll_never_fires() {
    let engine = engine(FakeApi::default());
    engine.schedule_poll(4, Duration::from_millis(80));
    engine.cancel_poll(4);

    let events = collect_for(&engine, Duration::from_millis(300));
    assert!(events.is_empty(), "unexpected events: {events:?}");
}

#[test]
fn cancelling_an_old_ticket_keeps_the_current_timer() {
    let engine = engine(FakeApi::default());
    engine.schedule_poll(5, Duration::from_millis(200));
    engine.cancel_poll(5);
    engine.schedule_poll(6, Duration::from_millis(20));
    engine.cancel_poll(5);

    let events = collect_for(&engine, Duration::from_millis(300));
    assert_eq!(events, vec![EngineEvent::TimerFired { ticket: 6 }]);
}

#[test]
fn dropping_the_engine_releases_the_timer() {
    let api = Arc::new(FakeApi::default());
    let engine = EngineHandle::with_api(api).expect("engine");
    engine.schedule_poll(9, Duration::from_secs(60));

    // Returns promptly instead of waiting for the timer.
    let started = std::time::Instant::now();
    drop(engine);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn slow_segmentation_reports_all_phases() {
    let engine = engine(FakeApi {
        segment_delay: SEGMENTATION_PHASE_DELAY + Duration::from_millis(100),
        ..FakeApi::default()
    });
    engine.segment(
        1,
        SegmentationRequest {
            content: "hello world".to_string(),
            options: SegmentationOptions::default(),
        },
    );

    let events = collect_for(&engine, SEGMENTATION_PHASE_DELAY + Duration::from_secs(1));
    let phases: Vec<SegmentationPhase> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::SegmentationProgress { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![SegmentationPhase::Sending, SegmentationPhase::Processing]
    );
    assert!(matches!(
        events.last(),
        Some(EngineEvent::SegmentationCompleted { run: 1, result: Ok(segments) })
            if segments.len() == 2
    ));
}

#[test]
fn confirm_reports_result_path() {
    let engine = engine(FakeApi::default());
    engine.confirm(ConfirmRequest {
        file_id: None,
        source_text: "text".to_string(),
        segments: Vec::new(),
    });

    let events = collect_for(&engine, Duration::from_millis(300));
    assert_eq!(
        events,
        vec![EngineEvent::ConfirmCompleted {
            result: Ok("saved.json".to_string())
        }]
    );
}
