use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use vidgrab_core::models::media::DownloadResult;

use crate::cli::Command;
use crate::AppContext;

pub mod auth;
pub mod batch;
pub mod download;
pub mod info;
pub mod platforms;
pub mod playlist;
pub mod process;
pub mod record;
pub mod schedule;

pub async fn execute(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Download { url, media } => download::run(ctx, &url, &media).await,
        Command::Batch {
            file,
            concurrency,
            media,
        } => batch::run(ctx, &file, concurrency, &media).await,
        Command::Playlist {
            url,
            channel,
            info_only,
            media,
        } => playlist::run(ctx, &url, channel, info_only, &media).await,
        Command::Info {
            url,
            json,
            thumbnail,
        } => info::run(ctx, &url, json, thumbnail.as_deref()).await,
        Command::Record { url, media } => record::run(ctx, &url, &media).await,
        Command::Process { input } => process::run(&input).await,
        Command::Auth {
            platform,
            cookies_file,
            cookies,
            token,
            logout,
        } => {
            if logout {
                auth::logout(ctx, platform).await
            } else {
                auth::login(ctx, platform, cookies_file, &cookies, token).await
            }
        }
        Command::Schedule {
            url,
            at,
            repeat,
            days,
            day_of_month,
            until,
            media,
        } => {
            let rule = schedule::build_rule(at, repeat, days, day_of_month, until);
            schedule::run(ctx, &url, rule, &media).await
        }
        Command::Platforms => {
            platforms::run(ctx);
            Ok(())
        }
    }
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb
}

fn count_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.blue} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// Renders percentages arriving on a download's progress channel.
pub struct PercentBar {
    bar: ProgressBar,
    forwarder: JoinHandle<()>,
}

impl PercentBar {
    /// Returns the bar and the sender to put into `DownloadOptions::progress`.
    pub fn start(message: impl Into<String>) -> (Self, mpsc::Sender<f64>) {
        let bar = ProgressBar::new(1000);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.blue} {msg} [{bar:40.cyan/blue}] {percent}% ({elapsed})",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(120));

        let (tx, mut rx) = mpsc::channel::<f64>(64);
        let target = bar.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(percent) = rx.recv().await {
                target.set_position((percent * 10.0).round() as u64);
            }
        });
        (Self { bar, forwarder }, tx)
    }

    /// Waits until every sender is gone, then clears the bar.
    pub async fn finish(self) {
        let _ = self.forwarder.await;
        self.bar.finish_and_clear();
    }
}

pub fn print_result(result: &DownloadResult) {
    if result.success {
        match &result.file_path {
            Some(path) => println!("✓ {} -> {}", result.message, path.display()),
            None => println!("✓ {}", result.message),
        }
    } else {
        eprintln!("✗ {}", result.message);
    }
}
