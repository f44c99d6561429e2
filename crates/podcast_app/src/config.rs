//! RON configuration for the command-line front end.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Flags from the command line are applied on top (see `cli.rs`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use podcast_core::{EndpointLayout, TrackerSettings};
use podcast_engine::ApiSettings;
use serde::{Deserialize, Serialize};
use url::Url;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "podcast.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum EndpointsConfig {
    #[default]
    Current,
    Legacy,
}

impl From<EndpointsConfig> for EndpointLayout {
    fn from(value: EndpointsConfig) -> Self {
        match value {
            EndpointsConfig::Current => EndpointLayout::Current,
            EndpointsConfig::Legacy => EndpointLayout::Legacy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppConfig {
    pub server: String,
    pub endpoints: EndpointsConfig,
    pub model: Option<String>,
    /// Refuse to submit without a token.
    pub require_auth: bool,
    pub poll_interval_ms: u64,
    pub poll_max_retries: u32,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub max_upload_mib: u64,
    pub download_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8000".to_string(),
            endpoints: EndpointsConfig::Current,
            model: None,
            require_auth: false,
            poll_interval_ms: 1000,
            poll_max_retries: 3,
            request_timeout_secs: 30,
            upload_timeout_secs: 300,
            max_upload_mib: 50,
            download_dir: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Reads `path`, or `./podcast.ron` when no path is given and it exists.
    ///
    /// Also returns the file that was read. This runs before logging is set
    /// up (the log file is a config value), so the caller logs it.
    pub fn load(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok((Self::default(), None));
                }
                fallback
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok((config, Some(path)))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn server_url(&self) -> anyhow::Result<Url> {
        Url::parse(self.server.trim())
            .with_context(|| format!("invalid server url {:?}", self.server))
    }

    pub fn tracker_settings(&self) -> anyhow::Result<TrackerSettings> {
        let mut settings = TrackerSettings::new(self.server_url()?);
        settings.endpoints = self.endpoints.into();
        settings.require_auth = self.require_auth;
        settings.max_upload_bytes = self.max_upload_mib.saturating_mul(1024 * 1024);
        settings.poll.interval = Duration::from_millis(self.poll_interval_ms.max(1));
        settings.poll.max_retries = self.poll_max_retries;
        Ok(settings)
    }

    pub fn api_settings(&self, auth_token: Option<String>) -> anyhow::Result<ApiSettings> {
        let mut settings = ApiSettings::new(self.server_url()?);
        settings.endpoints = self.endpoints.into();
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs.max(1));
        settings.upload_timeout = Duration::from_secs(self.upload_timeout_secs.max(1));
        settings.model = self.model.clone();
        settings.auth_token = auth_token.filter(|token| !token.trim().is_empty());
        Ok(settings)
    }
}
