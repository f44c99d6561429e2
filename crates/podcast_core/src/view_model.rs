use crate::{Phase, ResultHandoff, TaskId};

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerViewModel {
    pub phase: Phase,
    pub task_id: Option<TaskId>,
    /// Whole percent shown on the bar.
    pub percent: u8,
    /// Same value as a fraction in `[0, 1]`.
    pub displayed_progress: f64,
    pub status_message: String,
    pub error: Option<String>,
    /// Local feedback that does not end a session (validation, rejected submit).
    pub notice: Option<String>,
    pub result: Option<ResultHandoff>,
    /// The bar is still moving toward its last endpoint.
    pub animating: bool,
    pub dirty: bool,
}
