use std::path::{Path, PathBuf};

use podcast_core::ResultHandoff;
use podcast_logging::podcast_info;
use thiserror::Error;

use crate::{ApiError, AtomicFileWriter, PersistError, TaskApi};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed: {0}")]
    Fetch(#[from] ApiError),
    #[error("saving download failed: {0}")]
    Persist(#[from] PersistError),
}

/// Fetches the finished artifact and stores it as `{dir}/{filename}`.
///
/// The retrieval path is idempotent, so this may be repeated for the same result.
pub async fn download_result(
    api: &dyn TaskApi,
    result: &ResultHandoff,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, DownloadError> {
    let bytes = api.fetch_artifact(result.download_url()).await?;
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let path = writer.write(filename, &bytes)?;
    podcast_info!("Saved {} bytes to {:?}", bytes.len(), path);
    Ok(path)
}
