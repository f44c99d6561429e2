//! Podcast tracker engine: HTTP client, animation and effect execution.
mod animator;
mod api;
mod controller;
mod download;
mod filename;
mod persist;
mod types;

pub use animator::ProgressAnimator;
pub use api::{ApiSettings, ReqwestTaskApi, TaskApi};
pub use controller::{TaskController, TrackerSink};
pub use download::{download_result, DownloadError};
pub use filename::audio_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{ApiError, FailureKind};
