mod cli;
mod config;
mod terminal;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use podcast_core::{Msg, Phase, SourceFile};
use podcast_engine::{
    audio_filename, download_result, ReqwestTaskApi, TaskApi, TaskController,
};
use podcast_logging::{podcast_debug, podcast_info, podcast_warn, LogDestination};

use cli::Args;
use config::AppConfig;
use terminal::TerminalSink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let (mut config, config_path) = AppConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);
    init_logging(&args, &config);
    match &config_path {
        Some(path) => podcast_info!("Loaded config from {:?}", path),
        None => podcast_debug!("No config file; using defaults"),
    }

    let api = Arc::new(ReqwestTaskApi::new(config.api_settings(args.token.clone())?)?);

    if args.check {
        api.check_health()
            .await
            .with_context(|| format!("server {} is not healthy", config.server))?;
        eprintln!("Server {} is healthy", config.server);
        if args.pdf.is_none() {
            return Ok(());
        }
    }

    let source = args.pdf.as_deref().map(read_source).transpose()?;
    let source_name = source.as_ref().map(|file| file.name.clone());

    let sink = TerminalSink::stderr();
    let mut controller = TaskController::new(api.clone(), config.tracker_settings()?, Box::new(sink));
    controller.set_signed_in(api.settings().auth_token.is_some());

    let discard = controller.sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            podcast_warn!("Interrupted; discarding the tracked task");
            let _ = discard.send(Msg::Discard);
        }
    });

    controller.submit(source);
    match controller.run_until_settled().await {
        Phase::Completed => {}
        Phase::Failed => {
            let error = controller.state().view().error.unwrap_or_default();
            bail!("podcast conversion failed: {error}");
        }
        phase => {
            let view = controller.state().view();
            match view.notice {
                Some(notice) => bail!("{notice}"),
                None => bail!("tracking discarded ({phase:?})"),
            }
        }
    }

    let Some(result) = controller.state().result().cloned() else {
        bail!("completed without a result");
    };
    println!("{}", result.playback_url());

    if let Some(dir) = &config.download_dir {
        let filename = audio_filename(source_name.as_deref().unwrap_or_default(), result.task_id());
        let path = download_result(api.as_ref(), &result, dir, &filename).await?;
        podcast_info!("Episode saved to {:?}", path);
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}

fn init_logging(args: &Args, config: &AppConfig) {
    let file = config
        .log_file
        .clone()
        .unwrap_or_else(LogDestination::default_file);
    if args.verbose {
        podcast_logging::initialize(LogDestination::Both(file), LevelFilter::Debug);
    } else {
        podcast_logging::initialize(LogDestination::File(file), LevelFilter::Info);
    }
}

fn read_source(path: &Path) -> anyhow::Result<SourceFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(name, bytes))
}
