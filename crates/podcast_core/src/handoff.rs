use thiserror::Error;
use url::Url;

use crate::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("server url cannot carry a path: {0}")]
    NotABase(String),
}

/// Which route names the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointLayout {
    /// `create-podcast`, `podcast_status/{id}`, `get_podcast/{id}`.
    #[default]
    Current,
    /// `create-podcast`, `podcast/{id}/status`, `podcast/{id}`.
    Legacy,
}

impl EndpointLayout {
    pub fn create_segments(self) -> Vec<&'static str> {
        vec!["create-podcast"]
    }

    pub fn status_segments(self, task_id: &TaskId) -> Vec<&str> {
        match self {
            EndpointLayout::Current => vec!["podcast_status", task_id.as_str()],
            EndpointLayout::Legacy => vec!["podcast", task_id.as_str(), "status"],
        }
    }

    pub fn result_segments(self, task_id: &TaskId) -> Vec<&str> {
        match self {
            EndpointLayout::Current => vec!["get_podcast", task_id.as_str()],
            EndpointLayout::Legacy => vec!["podcast", task_id.as_str()],
        }
    }

    pub fn health_segments(self) -> Vec<&'static str> {
        vec!["health"]
    }
}

/// Appends percent-encoded path segments to `base`, keeping any base path prefix.
pub fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url, EndpointError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| EndpointError::NotABase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Where the finished artifact can be streamed and downloaded from.
///
/// Playback and download share one retrieval path; fetching it is idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandoff {
    task_id: TaskId,
    location: Url,
}

impl ResultHandoff {
    /// The retrieval path is always derived from the task id, under the same
    /// base path the status polls use.
    pub fn for_task(
        server: &Url,
        endpoints: EndpointLayout,
        task_id: &TaskId,
    ) -> Result<Self, EndpointError> {
        let location = endpoint_url(server, &endpoints.result_segments(task_id))?;
        Ok(Self {
            task_id: task_id.clone(),
            location,
        })
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Source for the media player.
    pub fn playback_url(&self) -> &Url {
        &self.location
    }

    /// Target of the download action; same resource as playback.
    pub fn download_url(&self) -> &Url {
        &self.location
    }
}
