use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use vidgrab_core::fs_paths::{AppPaths, DesktopPaths};
use vidgrab_core::models::settings::AppSettings;
use vidgrab_core::{Platform, PlatformDownloader};

use crate::core::dispatcher::Dispatcher;
use crate::core::http_client::HttpClient;
use crate::core::ytdlp::YtDlp;
use crate::platforms::generic::OpenGraphDownloader;
use crate::platforms::youtube::YouTubeDownloader;

pub mod cli;
pub mod commands;
pub mod core;
pub mod platforms;
pub mod storage;

/// Everything a command needs, built once at startup.
pub struct AppContext {
    pub settings: AppSettings,
    pub paths: Arc<dyn AppPaths>,
    pub http: HttpClient,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppContext {
    pub async fn load(config: Option<&Path>) -> anyhow::Result<Self> {
        let paths: Arc<dyn AppPaths> = Arc::new(DesktopPaths);
        let settings_file = config
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.settings_file());
        let settings = storage::config::load_or_init_settings(&settings_file);
        tracing::debug!("[app] settings from {}", settings_file.display());

        let http = HttpClient::new(&settings.network, &settings.proxy)?;
        let dispatcher = build_dispatcher(&settings, paths.as_ref(), http.clone());

        for session in core::auth::load_all_sessions(&paths.auth_dir()).await {
            let platform = session.platform;
            match dispatcher.set_authentication(platform, session) {
                Ok(()) => tracing::debug!("[app] restored {} session", platform),
                Err(e) => tracing::warn!("[app] stored session not applied: {}", e),
            }
        }

        Ok(Self {
            settings,
            paths,
            http,
            dispatcher: Arc::new(dispatcher),
        })
    }
}

/// One backend per platform. YouTube downloads through yt-dlp; the rest
/// only read page metadata.
pub fn build_dispatcher(settings: &AppSettings, paths: &dyn AppPaths, http: HttpClient) -> Dispatcher {
    let ytdlp = Arc::new(YtDlp::new(settings, paths.bin_dir(), http.clone()));
    let mut backends: Vec<Arc<dyn PlatformDownloader>> = Vec::new();
    backends.push(Arc::new(YouTubeDownloader::new(
        ytdlp,
        settings.network.stall_timeout(),
    )));

    for platform in [
        Platform::TikTok,
        Platform::Twitter,
        Platform::Vimeo,
        Platform::Twitch,
    ] {
        backends.push(Arc::new(OpenGraphDownloader::new(platform, http.clone())));
    }
    for platform in [Platform::Instagram, Platform::Facebook] {
        backends.push(Arc::new(
            OpenGraphDownloader::new(platform, http.clone()).with_authentication(),
        ));
    }

    Dispatcher::new(backends)
        .with_retry(settings.retry.clone())
        .with_concurrency(settings.batch.concurrency)
}

pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

/// Command failures are printed, not turned into an exit code.
pub async fn run() {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match AppContext::load(cli.config.as_deref()).await {
        Ok(ctx) => commands::execute(&ctx, cli.command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
    }
}
