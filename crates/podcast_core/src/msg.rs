use crate::{SourceFile, StatusReport, TaskId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Identity provider reported a sign-in change.
    IdentityChanged { signed_in: bool },
    /// User asked to convert a document; `None` when nothing was selected.
    SubmitRequested(Option<SourceFile>),
    /// Server accepted the upload and assigned a task id.
    TaskCreated { generation: u64, task_id: TaskId },
    /// Upload or creation request failed.
    SubmissionFailed { generation: u64, message: String },
    /// One status poll answered.
    StatusReceived {
        generation: u64,
        report: StatusReport,
    },
    /// One status poll failed at the transport or decode level.
    PollFailed { generation: u64, message: String },
    /// Animator produced an intermediate value (percent).
    ProgressFrame { generation: u64, percent: f64 },
    /// Animator reached its current endpoint and is idle.
    AnimationSettled { generation: u64, percent: f64 },
    /// User dismissed the result or abandoned tracking.
    Discard,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
