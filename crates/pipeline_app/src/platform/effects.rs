use std::time::Duration;

use pipeline_core::{Effect, Msg, Notification};
use pipeline_engine::{EngineEvent, EngineHandle};
use pipeline_logging::{engine_debug, engine_info};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Runs IO effects and returns the notifications meant for the host.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Notification> {
        let mut notifications = Vec::new();
        for effect in effects {
            match effect {
                Effect::FetchStatus { session, task_id } => {
                    engine_debug!("FetchStatus session={} task_id={}", session, task_id);
                    self.engine.fetch_status(session, task_id);
                }
                Effect::SchedulePoll { ticket, delay } => {
                    self.engine.schedule_poll(ticket, delay);
                }
                Effect::CancelPoll { ticket } => {
                    self.engine.cancel_poll(ticket);
                }
                Effect::RequestSegmentation { run, request } => {
                    engine_info!(
                        "RequestSegmentation run={} content_len={}",
                        run,
                        request.content.len()
                    );
                    self.engine.segment(run, request);
                }
                Effect::ConfirmResults { request } => {
                    engine_info!("ConfirmResults segments={}", request.segments.len());
                    self.engine.confirm(request);
                }
                Effect::Notify(notification) => notifications.push(notification),
            }
        }
        notifications
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::StatusFetched { session, result } => Msg::StatusReceived {
            session,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::TimerFired { ticket } => Msg::PollTimerFired { ticket },
        EngineEvent::SegmentationProgress { run, phase } => {
            Msg::SegmentationProgress { run, phase }
        }
        EngineEvent::SegmentationCompleted { run, result } => Msg::SegmentationFinished {
            run,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::ConfirmCompleted { result } => Msg::ConfirmFinished {
            result: result.map_err(|err| err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_engine::{ApiError, FailureKind};

    #[test]
    fn transport_errors_become_readable_messages() {
        let msg = map_event(EngineEvent::StatusFetched {
            session: 4,
            result: Err(ApiError {
                kind: FailureKind::HttpStatus(503),
                message: "503 Service Unavailable".to_string(),
            }),
        });
        assert_eq!(
            msg,
            Msg::StatusReceived {
                session: 4,
                result: Err("http status 503: 503 Service Unavailable".to_string()),
            }
        );
    }
}
