//! Task poller: tracks one backend job at a time by re-fetching its status.
//!
//! The poller owns at most one [`PollSession`]. A session owns at most one
//! pending re-poll ticket; every path that ends a session releases that ticket
//! through [`Effect::CancelPoll`] before anything else is scheduled. Fetch
//! results carry the session id they were issued for and timer firings carry
//! their ticket; anything that does not match the live session is dropped.
//!
//! Hosts must deliver [`crate::Msg::HaltPolling`] before tearing the poller
//! down so the engine can release its timer.

use std::time::{Duration, Instant};

use pipeline_logging::{engine_debug, engine_info, engine_warn};

use crate::{Effect, JobStatus, Notification, SessionId, TaskId, TaskStatus, TimerTicket};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Begin polling as soon as a job id is supplied.
    pub auto_start: bool,
    /// Presentation only: show refresh/stop controls.
    pub show_controls: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            auto_start: true,
            show_controls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSession {
    pub id: SessionId,
    pub task_id: TaskId,
    pub started_at: Instant,
    timer: Option<TimerTicket>,
    fetch_in_flight: bool,
}

impl PollSession {
    pub fn pending_timer(&self) -> Option<TimerTicket> {
        self.timer
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollerState {
    config: PollerConfig,
    session: Option<PollSession>,
    /// Job id most recently handed over by the application.
    assigned_task_id: Option<TaskId>,
    last_status: Option<JobStatus>,
    last_error: Option<String>,
    next_id: u64,
}

impl Default for PollerState {
    fn default() -> Self {
        Self::new(PollerConfig::default())
    }
}

impl PollerState {
    pub fn new(config: PollerConfig) -> Self {
        Self {
            config,
            session: None,
            assigned_task_id: None,
            last_status: None,
            last_error: None,
            next_id: 1,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&PollSession> {
        self.session.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.session.is_some()
    }

    pub fn last_status(&self) -> Option<&JobStatus> {
        self.last_status.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn assigned_task_id(&self) -> Option<&str> {
        self.assigned_task_id.as_deref()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn begin(&mut self, task_id: TaskId, started_at: Instant) -> Vec<Effect> {
        if task_id.trim().is_empty() {
            return Vec::new();
        }
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.task_id == task_id)
        {
            return Vec::new();
        }

        let mut effects = self.halt();
        let id = self.allocate_id();
        engine_info!("Poll session {} started for task {}", id, task_id);

        self.assigned_task_id = Some(task_id.clone());
        self.last_status = None;
        self.last_error = None;
        self.session = Some(PollSession {
            id,
            task_id: task_id.clone(),
            started_at,
            timer: None,
            fetch_in_flight: true,
        });

        effects.push(Effect::Notify(Notification::PollingStarted {
            task_id: task_id.clone(),
        }));
        effects.push(Effect::FetchStatus {
            session: id,
            task_id,
        });
        effects
    }

    pub(crate) fn halt(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        engine_info!(
            "Poll session {} halted for task {}",
            session.id,
            session.task_id
        );

        let mut effects = Vec::with_capacity(2);
        if let Some(ticket) = session.timer {
            effects.push(Effect::CancelPoll { ticket });
        }
        effects.push(Effect::Notify(Notification::PollingStopped {
            task_id: session.task_id,
        }));
        effects
    }

    pub(crate) fn job_id_changed(
        &mut self,
        task_id: Option<TaskId>,
        started_at: Instant,
    ) -> Vec<Effect> {
        let task_id = task_id.filter(|id| !id.trim().is_empty());
        match task_id {
            None => {
                self.assigned_task_id = None;
                self.halt()
            }
            Some(task_id) => {
                // Only a change of id re-enters; a finished job stays finished.
                if self.assigned_task_id.as_ref() == Some(&task_id) {
                    engine_debug!("Job id {} unchanged; nothing to do", task_id);
                    return Vec::new();
                }
                if self.config.auto_start {
                    self.begin(task_id, started_at)
                } else {
                    // Without auto start the old session must still not outlive the switch.
                    self.assigned_task_id = Some(task_id);
                    self.halt()
                }
            }
        }
    }

    pub(crate) fn refresh(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.fetch_in_flight {
            return Vec::new();
        }

        let mut effects = Vec::with_capacity(2);
        if let Some(ticket) = session.timer.take() {
            effects.push(Effect::CancelPoll { ticket });
        }
        session.fetch_in_flight = true;
        effects.push(Effect::FetchStatus {
            session: session.id,
            task_id: session.task_id.clone(),
        });
        effects
    }

    pub(crate) fn timer_fired(&mut self, ticket: TimerTicket) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            engine_debug!("Dropping timer {} with no active session", ticket);
            return Vec::new();
        };
        if session.timer != Some(ticket) {
            engine_debug!(
                "Dropping stale timer {} for session {}",
                ticket,
                session.id
            );
            return Vec::new();
        }

        session.timer = None;
        session.fetch_in_flight = true;
        vec![Effect::FetchStatus {
            session: session.id,
            task_id: session.task_id.clone(),
        }]
    }

    pub(crate) fn status_received(
        &mut self,
        session_id: SessionId,
        result: Result<JobStatus, String>,
    ) -> Vec<Effect> {
        let Some(session) = self.session.as_ref() else {
            engine_debug!("Dropping status for halted session {}", session_id);
            return Vec::new();
        };
        if session.id != session_id {
            engine_debug!(
                "Dropping status for superseded session {} (active {})",
                session_id,
                session.id
            );
            return Vec::new();
        }
        let task_id = session.task_id.clone();

        // A payload tagged with another job is treated like a malformed response.
        let result = result.and_then(|status| {
            if status.task_id.is_empty() || status.task_id == task_id {
                Ok(status)
            } else {
                Err(format!(
                    "status payload for task {} while polling {}",
                    status.task_id, task_id
                ))
            }
        });
        let status = match result {
            Ok(status) => status,
            Err(error) => {
                engine_warn!("Status fetch for task {} failed: {}", task_id, error);
                self.last_error = Some(error.clone());
                let mut effects = self.halt();
                effects.push(Effect::Notify(Notification::StatusFetchFailed {
                    task_id,
                    error,
                }));
                return effects;
            }
        };

        self.last_status = Some(status.clone());
        let mut effects = vec![Effect::Notify(Notification::StatusUpdated {
            task_id: task_id.clone(),
            status: status.clone(),
        })];

        match status.status {
            TaskStatus::Completed => {
                effects.extend(self.halt());
                effects.push(Effect::Notify(Notification::JobCompleted { task_id, status }));
            }
            TaskStatus::Failed => {
                effects.extend(self.halt());
                effects.push(Effect::Notify(Notification::JobFailed { task_id, status }));
            }
            _ => {
                let ticket = self.allocate_id();
                let delay = self.config.interval;
                if let Some(session) = self.session.as_mut() {
                    session.fetch_in_flight = false;
                    if let Some(previous) = session.timer.replace(ticket) {
                        effects.push(Effect::CancelPoll { ticket: previous });
                    }
                    effects.push(Effect::SchedulePoll { ticket, delay });
                }
            }
        }
        effects
    }
}
