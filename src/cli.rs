use std::path::PathBuf;

use chrono::{NaiveDateTime, Weekday};
use clap::{Args, Parser, Subcommand};

use vidgrab_core::models::media::{DownloadOptions, Format, Quality};
use vidgrab_core::models::settings::DownloadSettings;
use vidgrab_core::Platform;

use crate::core::scheduler::Recurrence;

#[derive(Parser, Debug)]
#[command(name = "vidgrab", author, version, about, long_about = None)]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Settings file (defaults to settings.json in the data directory)
    #[arg(long, global = true, env = "VIDGRAB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MediaArgs {
    #[arg(short, long)]
    pub quality: Option<Quality>,

    #[arg(short, long)]
    pub format: Option<Format>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File name; the format's extension is appended when missing
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    #[arg(long)]
    pub no_audio: bool,

    #[arg(long)]
    pub no_video: bool,
}

impl MediaArgs {
    /// Flags override the configured download defaults.
    pub fn to_options(&self, defaults: &DownloadSettings) -> DownloadOptions {
        DownloadOptions {
            quality: self.quality.unwrap_or(defaults.quality),
            format: self.format.unwrap_or(defaults.format),
            output_path: self
                .output
                .clone()
                .unwrap_or_else(|| defaults.output_dir.clone()),
            file_name: self.name.clone(),
            include_audio: !self.no_audio,
            include_video: !self.no_video,
            progress: None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download a single video
    Download {
        url: String,
        #[command(flatten)]
        media: MediaArgs,
    },

    /// Download every URL listed in a file (one per line, '#' starts a comment)
    Batch {
        file: PathBuf,
        #[arg(short, long)]
        concurrency: Option<usize>,
        #[command(flatten)]
        media: MediaArgs,
    },

    /// Download or list a playlist or channel
    Playlist {
        url: String,
        /// Treat the URL as a channel
        #[arg(long)]
        channel: bool,
        /// List entries without downloading
        #[arg(long)]
        info_only: bool,
        #[command(flatten)]
        media: MediaArgs,
    },

    /// Show metadata for a URL
    Info {
        url: String,
        #[arg(long)]
        json: bool,
        /// Save the thumbnail to this path
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },

    /// Record a live stream
    Record {
        url: String,
        #[command(flatten)]
        media: MediaArgs,
    },

    /// Post-process a downloaded file
    Process { input: PathBuf },

    /// Store or remove credentials for a platform
    Auth {
        platform: Platform,
        /// Netscape cookies file
        #[arg(long)]
        cookies_file: Option<PathBuf>,
        /// Inline cookie as name=value; repeatable
        #[arg(long = "cookie", value_name = "NAME=VALUE")]
        cookies: Vec<String>,
        /// Bearer token
        #[arg(long)]
        token: Option<String>,
        /// Remove the stored session
        #[arg(long, conflicts_with_all = ["cookies_file", "cookies", "token"])]
        logout: bool,
    },

    /// Schedule a download; runs until Ctrl-C or the schedule ends
    Schedule {
        url: String,
        /// First run, local time
        #[arg(long, value_name = "YYYY-MM-DD HH:MM", value_parser = parse_local_time)]
        at: NaiveDateTime,
        #[arg(long, default_value = "once")]
        repeat: Recurrence,
        /// Weekdays for weekly schedules, e.g. mon,wed,fri
        #[arg(long, value_delimiter = ',')]
        days: Vec<Weekday>,
        #[arg(long)]
        day_of_month: Option<u32>,
        /// Last allowed run, local time
        #[arg(long, value_name = "YYYY-MM-DD HH:MM", value_parser = parse_local_time)]
        until: Option<NaiveDateTime>,
        #[command(flatten)]
        media: MediaArgs,
    },

    /// List supported platforms and their capabilities
    Platforms,
}

pub fn parse_local_time(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("expected \"YYYY-MM-DD HH:MM\", got \"{}\"", s))
}
