//! Podcast tracker core: pure state machine and view-model helpers.
mod effect;
mod handoff;
mod msg;
mod ramp;
mod settings;
mod state;
mod update;
mod validate;
mod view_model;

pub use effect::Effect;
pub use handoff::{endpoint_url, EndpointError, EndpointLayout, ResultHandoff};
pub use msg::Msg;
pub use ramp::{percent_from_fraction, ProgressRamp, DEFAULT_TICK};
pub use settings::{PollPolicy, TrackerSettings};
pub use state::{ClientTaskState, Phase, SourceFile, StatusReport, TaskId, TaskStatus};
pub use update::update;
pub use validate::{validate_source, SubmissionRules, ValidationError, REQUIRED_EXTENSION};
pub use view_model::TrackerViewModel;
