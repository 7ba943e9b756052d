use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use pipeline_core::{update, AppState, Msg, Notification, Segment, SegmentationOptions};
use pipeline_engine::EngineHandle;
use pipeline_logging::{engine_debug, engine_info, engine_warn};

use super::effects::EffectRunner;
use super::render::{describe_notification, render};
use super::settings::AppSettings;

/// How long the loop waits for an engine event before checking the clock.
const EVENT_WAIT: Duration = Duration::from_millis(100);
/// Interval of the elapsed-time refresh.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What the user asked the shell to do.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub job_id: Option<String>,
    pub source_text: Option<String>,
    pub file_id: Option<String>,
    pub confirm: bool,
}

pub fn run_app(settings: &AppSettings, request: RunRequest) -> anyhow::Result<()> {
    let engine = EngineHandle::new(settings.client_settings())?;
    let mut app = App::new(
        AppState::with_config(settings.poller_config()),
        EffectRunner::new(engine),
        settings.segmentation_options(),
        request,
    );

    app.start();
    app.run_until_idle();
    app.teardown();
    app.outcome()
}

struct App {
    state: AppState,
    runner: EffectRunner,
    options: SegmentationOptions,
    request: RunRequest,
    /// Text waiting for the tracked job to complete before segmentation.
    pending_text: Option<String>,
    /// Host-side copy of the segment collection, replaced on every snapshot.
    segments: Vec<Segment>,
    failure: Option<String>,
    last_rendered: Vec<String>,
    last_tick: Instant,
}

impl App {
    fn new(
        state: AppState,
        runner: EffectRunner,
        options: SegmentationOptions,
        request: RunRequest,
    ) -> Self {
        Self {
            state,
            runner,
            options,
            request,
            pending_text: None,
            segments: Vec::new(),
            failure: None,
            last_rendered: Vec::new(),
            last_tick: Instant::now(),
        }
    }

    fn start(&mut self) {
        let text = self.request.source_text.clone();
        match self.request.job_id.clone() {
            Some(job_id) => {
                self.pending_text = text;
                self.dispatch(Msg::JobIdChanged {
                    task_id: Some(job_id.clone()),
                    started_at: Instant::now(),
                });
                if !self.state.poller().is_polling() {
                    // Auto start is off; the shell acts as the start button.
                    engine_info!("Auto start disabled; starting task {} on request", job_id);
                    self.dispatch(Msg::BeginPolling {
                        task_id: job_id,
                        started_at: Instant::now(),
                    });
                }
            }
            None => {
                if let Some(text) = text {
                    self.request_segmentation(text);
                }
            }
        }
    }

    fn run_until_idle(&mut self) {
        while self.state.is_busy() {
            if let Some(msg) = self.runner.next_msg(EVENT_WAIT) {
                self.dispatch(msg);
            }
            if self.last_tick.elapsed() >= TICK_INTERVAL {
                self.last_tick = Instant::now();
                self.dispatch(Msg::Tick);
            }
        }
    }

    /// Releases the poll session before the engine is dropped.
    fn teardown(&mut self) {
        self.dispatch(Msg::HaltPolling);
        engine_debug!(
            "Shell finished with {} segments in the host copy",
            self.segments.len()
        );
    }

    fn outcome(&self) -> anyhow::Result<()> {
        match &self.failure {
            Some(reason) => Err(anyhow!(reason.clone())),
            None => Ok(()),
        }
    }

    fn request_segmentation(&mut self, source_text: String) {
        self.dispatch(Msg::SegmentationRequested {
            source_text,
            file_id: self.request.file_id.clone(),
            options: self.options.clone(),
        });
    }

    fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for notification in self.runner.enqueue(effects) {
                inbox.extend(self.on_notification(notification));
            }
        }

        if self.state.consume_dirty() {
            self.render();
        }
    }

    /// Reacts to core notifications the way an embedding UI would.
    fn on_notification(&mut self, notification: Notification) -> Vec<Msg> {
        if let Some(text) = describe_notification(&notification) {
            match &notification {
                Notification::JobFailed { .. }
                | Notification::StatusFetchFailed { .. }
                | Notification::SegmentationFailed { .. }
                | Notification::ConfirmFailed { .. } => {
                    engine_warn!("{}", text);
                    eprintln!("[!] {}", text);
                    self.failure = Some(text);
                    self.pending_text = None;
                }
                _ => println!("[i] {}", text),
            }
        }

        match notification {
            Notification::JobCompleted { .. } => match self.pending_text.take() {
                Some(source_text) => vec![Msg::SegmentationRequested {
                    source_text,
                    file_id: self.request.file_id.clone(),
                    options: self.options.clone(),
                }],
                None => Vec::new(),
            },
            Notification::SegmentationCompleted { .. } if self.request.confirm => {
                vec![Msg::ConfirmClicked {
                    source_text: self.request.source_text.clone().unwrap_or_default(),
                }]
            }
            Notification::SegmentsChanged(snapshot) => {
                engine_debug!("Host copy synchronized: {} segments", snapshot.len());
                self.segments = snapshot;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&mut self) {
        let lines = render(&self.state.view_at(Instant::now()));
        if lines != self.last_rendered {
            for line in &lines {
                println!("{}", line);
            }
            self.last_rendered = lines;
        }
    }
}
