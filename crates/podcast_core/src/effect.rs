use std::time::Duration;

use crate::{ResultHandoff, SourceFile, TaskId};

/// Side effects requested by `update`; executed by the engine's controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start a fresh tracking session: new cancellation scope and animator.
    BeginSession { generation: u64 },
    /// Raise the progress animation endpoint to `target` percent.
    AnimateTo {
        generation: u64,
        target: u8,
        duration: Duration,
    },
    /// Upload the source file and create the server-side task.
    CreateTask { generation: u64, file: SourceFile },
    /// Fetch the task status once `delay` has elapsed.
    PollStatus {
        generation: u64,
        task_id: TaskId,
        delay: Duration,
    },
    /// Expose the finished artifact to playback and download.
    Handoff(ResultHandoff),
    /// Stop observing the current task. The server-side task keeps running.
    CancelTracking,
}
