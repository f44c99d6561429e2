use std::sync::Arc;
use std::time::Duration;

use podcast_core::{
    update, ClientTaskState, Effect, Msg, Phase, ResultHandoff, SourceFile, TaskId,
    TrackerSettings, TrackerViewModel,
};
use podcast_logging::{podcast_debug, podcast_info, podcast_warn, set_tracked_task};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{ProgressAnimator, TaskApi};

/// Presentation surface fed by the controller.
pub trait TrackerSink {
    /// Called whenever the view model changed.
    fn render(&mut self, view: &TrackerViewModel);

    /// Called exactly once per successfully completed task.
    fn handoff(&mut self, result: &ResultHandoff);
}

struct Session {
    generation: u64,
    cancel: CancellationToken,
    animator: ProgressAnimator,
}

/// Owns the single `ClientTaskState` and executes the effects `update` asks for.
///
/// Background work (upload, polls, animation) runs as tokio tasks that report
/// back through one channel; `update` is only ever called from here.
pub struct TaskController {
    api: Arc<dyn TaskApi>,
    state: ClientTaskState,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    session: Option<Session>,
    sink: Box<dyn TrackerSink>,
}

impl TaskController {
    pub fn new(
        api: Arc<dyn TaskApi>,
        settings: TrackerSettings,
        sink: Box<dyn TrackerSink>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            api,
            state: ClientTaskState::new(settings),
            msg_tx,
            msg_rx,
            session: None,
            sink,
        }
    }

    pub fn state(&self) -> &ClientTaskState {
        &self.state
    }

    /// Handle for delivering messages from outside, e.g. a Ctrl-C handler.
    pub fn sender(&self) -> mpsc::UnboundedSender<Msg> {
        self.msg_tx.clone()
    }

    pub fn set_signed_in(&mut self, signed_in: bool) {
        self.dispatch(Msg::IdentityChanged { signed_in });
    }

    pub fn submit(&mut self, file: Option<SourceFile>) {
        self.dispatch(Msg::SubmitRequested(file));
    }

    pub fn discard(&mut self) {
        self.dispatch(Msg::Discard);
    }

    /// Applies one message and runs the resulting effects.
    pub fn dispatch(&mut self, msg: Msg) {
        let (mut state, effects) = update(self.state.clone(), msg);
        let changed = state.consume_dirty();
        self.state = state;
        set_tracked_task(self.state.active_task_id().map(TaskId::as_str));

        for effect in effects {
            self.execute(effect);
        }
        if !self.session_in_flight() {
            self.end_session();
        }
        if changed {
            self.sink.render(&self.state.view());
        }
    }

    /// Processes background messages until no session is in flight.
    pub async fn run_until_settled(&mut self) -> Phase {
        while self.session.is_some() && self.session_in_flight() {
            match self.msg_rx.recv().await {
                Some(msg) => self.dispatch(msg),
                None => break,
            }
        }
        self.drain_pending();
        self.state.phase()
    }

    /// Applies messages that are already queued without waiting for more.
    pub fn drain_pending(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::BeginSession { generation } => {
                self.end_session();
                let cancel = CancellationToken::new();
                let animator = ProgressAnimator::spawn(
                    generation,
                    self.state.settings().animation_tick,
                    cancel.clone(),
                    self.msg_tx.clone(),
                );
                self.session = Some(Session {
                    generation,
                    cancel,
                    animator,
                });
            }
            Effect::AnimateTo {
                generation,
                target,
                duration,
            } => {
                if let Some(session) = self.current_session(generation) {
                    session.animator.raise_to(target, duration);
                }
            }
            Effect::CreateTask { generation, file } => {
                let Some(cancel) = self.current_session(generation).map(|s| s.cancel.clone()) else {
                    return;
                };
                tokio::spawn(create_task(
                    self.api.clone(),
                    generation,
                    file,
                    cancel,
                    self.msg_tx.clone(),
                ));
            }
            Effect::PollStatus {
                generation,
                task_id,
                delay,
            } => {
                let Some(cancel) = self.current_session(generation).map(|s| s.cancel.clone()) else {
                    return;
                };
                tokio::spawn(poll_status(
                    self.api.clone(),
                    generation,
                    task_id,
                    delay,
                    cancel,
                    self.msg_tx.clone(),
                ));
            }
            Effect::Handoff(result) => {
                podcast_info!("Handing off {}", result.download_url());
                self.sink.handoff(&result);
            }
            Effect::CancelTracking => self.end_session(),
        }
    }

    /// A session lives while it is active or its bar is still moving.
    fn session_in_flight(&self) -> bool {
        self.state.phase().is_active() || self.state.is_animating()
    }

    fn current_session(&self, generation: u64) -> Option<&Session> {
        self.session
            .as_ref()
            .filter(|session| session.generation == generation)
    }

    fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            podcast_debug!("Ending session {}", session.generation);
            session.cancel.cancel();
        }
    }
}

impl Drop for TaskController {
    fn drop(&mut self) {
        self.end_session();
    }
}

async fn create_task(
    api: Arc<dyn TaskApi>,
    generation: u64,
    file: SourceFile,
    cancel: CancellationToken,
    msg_tx: mpsc::UnboundedSender<Msg>,
) {
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = api.create_task(&file) => result,
    };
    let msg = match result {
        Ok(task_id) => Msg::TaskCreated {
            generation,
            task_id,
        },
        Err(err) => {
            podcast_warn!("Creating task for {} failed: {}", file.name, err);
            Msg::SubmissionFailed {
                generation,
                message: err.to_string(),
            }
        }
    };
    let _ = msg_tx.send(msg);
}

/// One poll: wait, re-check cancellation, fetch, report.
async fn poll_status(
    api: Arc<dyn TaskApi>,
    generation: u64,
    task_id: TaskId,
    delay: Duration,
    cancel: CancellationToken,
    msg_tx: mpsc::UnboundedSender<Msg>,
) {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(delay) => {}
    }
    if cancel.is_cancelled() {
        return;
    }
    let msg = match api.task_status(&task_id).await {
        Ok(report) => Msg::StatusReceived { generation, report },
        Err(err) => Msg::PollFailed {
            generation,
            message: err.to_string(),
        },
    };
    let _ = msg_tx.send(msg);
}
