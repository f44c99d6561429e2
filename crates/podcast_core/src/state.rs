use std::fmt;

use crate::view_model::TrackerViewModel;
use crate::{ResultHandoff, SubmissionRules, TrackerSettings};

/// Opaque server-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-authoritative task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// One status snapshot as reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub status: TaskStatus,
    /// Fraction in `[0, 1]`; absent while queued.
    pub progress: Option<f64>,
    pub message: String,
}

/// Document selected for conversion.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Tracking,
    Completed,
    Failed,
}

impl Phase {
    /// A session is in flight and owns the tracker.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Uploading | Phase::Tracking)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

/// Client-side view of the single tracked task.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientTaskState {
    settings: TrackerSettings,
    signed_in: bool,
    generation: u64,
    phase: Phase,
    active_task_id: Option<TaskId>,
    /// Last rendered value, in percent.
    displayed_percent: f64,
    /// Highest animation endpoint requested for this session.
    requested_percent: u8,
    status_message: String,
    error: Option<String>,
    notice: Option<String>,
    consecutive_poll_failures: u32,
    /// The server reported completion; waiting for the bar to reach 100%.
    completion_pending: bool,
    result: Option<ResultHandoff>,
    dirty: bool,
}

impl ClientTaskState {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            signed_in: false,
            generation: 0,
            phase: Phase::Idle,
            active_task_id: None,
            displayed_percent: 0.0,
            requested_percent: 0,
            status_message: String::new(),
            error: None,
            notice: None,
            consecutive_poll_failures: 0,
            completion_pending: false,
            result: None,
            dirty: false,
        }
    }

    pub fn view(&self) -> TrackerViewModel {
        TrackerViewModel {
            phase: self.phase,
            task_id: self.active_task_id.clone(),
            percent: self.displayed_percent.floor().clamp(0.0, 100.0) as u8,
            displayed_progress: self.displayed_progress(),
            status_message: self.status_message.clone(),
            error: self.error.clone(),
            notice: self.notice.clone(),
            result: self.result.clone(),
            animating: self.is_animating(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_task_id(&self) -> Option<&TaskId> {
        self.active_task_id.as_ref()
    }

    /// Displayed progress as a fraction in `[0, 1]`.
    pub fn displayed_progress(&self) -> f64 {
        (self.displayed_percent / 100.0).clamp(0.0, 1.0)
    }

    pub fn result(&self) -> Option<&ResultHandoff> {
        self.result.as_ref()
    }

    /// The bar has not yet reached the last requested endpoint.
    ///
    /// Stays true after a failure until the running ramp has finished, so the
    /// upload ramp always ends at its ceiling.
    pub fn is_animating(&self) -> bool {
        self.displayed_percent < f64::from(self.requested_percent)
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) fn submission_rules(&self) -> SubmissionRules {
        SubmissionRules {
            max_bytes: self.settings.max_upload_bytes,
            require_auth: self.settings.require_auth,
            signed_in: self.signed_in,
        }
    }

    pub(crate) fn set_signed_in(&mut self, signed_in: bool) {
        if self.signed_in != signed_in {
            self.signed_in = signed_in;
            self.dirty = true;
        }
    }

    pub(crate) fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
        self.dirty = true;
    }

    /// Drops everything tied to the previous session and invalidates its messages.
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.phase = Phase::Idle;
        self.active_task_id = None;
        self.displayed_percent = 0.0;
        self.requested_percent = 0;
        self.status_message.clear();
        self.error = None;
        self.notice = None;
        self.consecutive_poll_failures = 0;
        self.completion_pending = false;
        self.result = None;
        self.dirty = true;
    }

    pub(crate) fn begin_upload(&mut self) -> u64 {
        self.reset();
        self.phase = Phase::Uploading;
        self.status_message = "Uploading PDF...".to_string();
        self.generation
    }

    pub(crate) fn start_tracking(&mut self, task_id: TaskId) {
        self.active_task_id = Some(task_id);
        self.phase = Phase::Tracking;
        self.dirty = true;
    }

    pub(crate) fn set_status_message(&mut self, message: String) {
        if self.status_message != message {
            self.status_message = message;
            self.dirty = true;
        }
    }

    /// Records a new animation endpoint; returns false when it would not raise it.
    pub(crate) fn request_percent(&mut self, target: u8) -> bool {
        if target > self.requested_percent {
            self.requested_percent = target;
            true
        } else {
            false
        }
    }

    /// Applies an animator value; lower values are ignored.
    pub(crate) fn advance_display(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        if percent > self.displayed_percent {
            self.displayed_percent = percent;
            self.dirty = true;
        }
    }

    pub(crate) fn displayed_percent(&self) -> f64 {
        self.displayed_percent
    }

    pub(crate) fn record_poll_failure(&mut self) -> u32 {
        self.consecutive_poll_failures += 1;
        self.consecutive_poll_failures
    }

    pub(crate) fn clear_poll_failures(&mut self) {
        self.consecutive_poll_failures = 0;
    }

    pub(crate) fn await_completion(&mut self) {
        self.completion_pending = true;
    }

    pub(crate) fn is_awaiting_completion(&self) -> bool {
        self.completion_pending
    }

    pub(crate) fn complete(&mut self, result: ResultHandoff) {
        self.phase = Phase::Completed;
        self.result = Some(result);
        self.completion_pending = false;
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>) {
        self.phase = Phase::Failed;
        self.error = Some(error.into());
        self.completion_pending = false;
        self.dirty = true;
    }
}
