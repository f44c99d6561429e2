use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, EndpointsConfig};

/// Turn a PDF into a podcast episode and follow the conversion live.
#[derive(Parser, Debug)]
#[command(name = "podcast")]
#[command(version)]
#[command(about = "Submit a PDF for podcast conversion and track its progress", long_about = None)]
pub(crate) struct Args {
    /// PDF document to convert
    pub pdf: Option<PathBuf>,

    /// Configuration file (RON); defaults to ./podcast.ron when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Conversion server base URL
    #[arg(long)]
    pub server: Option<String>,

    /// Use the older `podcast/{id}` endpoint layout
    #[arg(long)]
    pub legacy: bool,

    /// Generation model requested from the server
    #[arg(long)]
    pub model: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "PODCAST_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Save the finished episode into this directory
    #[arg(short, long)]
    pub download: Option<PathBuf>,

    /// Check server health before submitting (or only check, without a PDF)
    #[arg(long)]
    pub check: bool,

    /// Log file path (default: ./podcast.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Also log to the terminal, at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Command-line flags win over file values.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(server) = &self.server {
            config.server = server.clone();
        }
        if self.legacy {
            config.endpoints = EndpointsConfig::Legacy;
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(dir) = &self.download {
            config.download_dir = Some(dir.clone());
        }
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
    }
}
