use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use pipeline_core::{
    ConfirmRequest, RunId, SegmentationPhase, SegmentationRequest, SessionId, TaskId,
    TimerTicket,
};
use pipeline_logging::{engine_debug, engine_info, engine_warn};

use crate::client::{ClientSettings, PipelineApi, ReqwestPipelineApi};
use crate::{EngineError, EngineEvent};

/// How long a segmentation call shows "sending" before it switches to "processing".
pub const SEGMENTATION_PHASE_DELAY: Duration = Duration::from_millis(800);

enum EngineCommand {
    FetchStatus { session: SessionId, task_id: TaskId },
    SchedulePoll { ticket: TimerTicket, delay: Duration },
    CancelPoll { ticket: TimerTicket },
    Segment { run: RunId, request: SegmentationRequest },
    Confirm { request: ConfirmRequest },
}

/// The one re-poll timer the engine may hold.
struct PendingTimer {
    ticket: TimerTicket,
    cancel: CancellationToken,
}

/// Executes IO on a background runtime and reports results as [`EngineEvent`]s.
///
/// Dropping the handle stops the worker and cancels any pending re-poll timer.
pub struct EngineHandle {
    cmd_tx: Option<mpsc::Sender<EngineCommand>>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let api = ReqwestPipelineApi::new(settings)?;
        Self::with_api(Arc::new(api))
    }

    pub fn with_api(api: Arc<dyn PipelineApi>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = Runtime::new()?;

        let worker = thread::spawn(move || {
            let mut timer: Option<PendingTimer> = None;
            while let Ok(command) = cmd_rx.recv() {
                handle_command(&runtime, &api, &event_tx, &mut timer, command);
            }
            if let Some(pending) = timer.take() {
                engine_debug!("Releasing re-poll timer {} on shutdown", pending.ticket);
                pending.cancel.cancel();
            }
            runtime.shutdown_background();
        });

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            worker: Some(worker),
        })
    }

    pub fn fetch_status(&self, session: SessionId, task_id: impl Into<TaskId>) {
        self.send(EngineCommand::FetchStatus {
            session,
            task_id: task_id.into(),
        });
    }

    pub fn schedule_poll(&self, ticket: TimerTicket, delay: Duration) {
        self.send(EngineCommand::SchedulePoll { ticket, delay });
    }

    pub fn cancel_poll(&self, ticket: TimerTicket) {
        self.send(EngineCommand::CancelPoll { ticket });
    }

    pub fn segment(&self, run: RunId, request: SegmentationRequest) {
        self.send(EngineCommand::Segment { run, request });
    }

    pub fn confirm(&self, request: ConfirmRequest) {
        self.send(EngineCommand::Confirm { request });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let delivered = self
            .cmd_tx
            .as_ref()
            .is_some_and(|tx| tx.send(command).is_ok());
        if !delivered {
            engine_warn!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn handle_command(
    runtime: &Runtime,
    api: &Arc<dyn PipelineApi>,
    event_tx: &mpsc::Sender<EngineEvent>,
    timer: &mut Option<PendingTimer>,
    command: EngineCommand,
) {
    match command {
        EngineCommand::FetchStatus { session, task_id } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.fetch_status(&task_id).await;
                let _ = event_tx.send(EngineEvent::StatusFetched { session, result });
            });
        }
        EngineCommand::SchedulePoll { ticket, delay } => {
            if let Some(previous) = timer.take() {
                engine_warn!(
                    "Re-poll timer {} replaced by {} without cancel",
                    previous.ticket,
                    ticket
                );
                previous.cancel.cancel();
            }
            let cancel = CancellationToken::new();
            let child = cancel.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                tokio::select! {
                    _ = child.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {
                        let _ = event_tx.send(EngineEvent::TimerFired { ticket });
                    }
                }
            });
            *timer = Some(PendingTimer { ticket, cancel });
        }
        EngineCommand::CancelPoll { ticket } => match timer.take() {
            Some(pending) if pending.ticket == ticket => {
                engine_debug!("Cancelled re-poll timer {}", ticket);
                pending.cancel.cancel();
            }
            other => *timer = other,
        },
        EngineCommand::Segment { run, request } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            engine_info!("Segmentation run {} sent to backend", run);
            runtime.spawn(async move {
                let progress = |phase| {
                    let _ = event_tx.send(EngineEvent::SegmentationProgress { run, phase });
                };
                progress(SegmentationPhase::Sending);

                let call = api.segment(&request);
                tokio::pin!(call);
                let result = tokio::select! {
                    result = &mut call => result,
                    _ = tokio::time::sleep(SEGMENTATION_PHASE_DELAY) => {
                        progress(SegmentationPhase::Processing);
                        call.await
                    }
                };
                let _ = event_tx.send(EngineEvent::SegmentationCompleted { run, result });
            });
        }
        EngineCommand::Confirm { request } => {
            let api = api.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = api.confirm(&request).await;
                let _ = event_tx.send(EngineEvent::ConfirmCompleted { result });
            });
        }
    }
}
