use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{DownloadError, ErrorDetail};
use crate::platforms::Platform;

pub const DEFAULT_OUTPUT_DIR: &str = "./downloads";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub platform: Option<Platform>,
    pub upload_date: Option<String>,
    pub views: Option<u64>,
    pub file_size_bytes: Option<u64>,
    pub is_live: Option<bool>,
    pub is_private: Option<bool>,
    pub age_restricted: Option<bool>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Quality {
    #[default]
    Highest,
    Lowest,
    AudioOnly,
    Hd,
    Sd,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    #[default]
    Mp4,
    Mp3,
    Webm,
    M4a,
    Mkv,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Mp4 => "mp4",
            Format::Mp3 => "mp3",
            Format::Webm => "webm",
            Format::M4a => "m4a",
            Format::Mkv => "mkv",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Format::Mp3 | Format::M4a)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadOptions {
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub format: Format,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default = "default_true")]
    pub include_audio: bool,
    #[serde(default = "default_true")]
    pub include_video: bool,
    /// Receives percentages in `0.0..=100.0`.
    #[serde(skip)]
    pub progress: Option<mpsc::Sender<f64>>,
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_true() -> bool {
    true
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            format: Format::default(),
            output_path: default_output_path(),
            file_name: None,
            include_audio: true,
            include_video: true,
            progress: None,
        }
    }
}

impl DownloadOptions {
    pub fn without_progress(&self) -> Self {
        Self {
            progress: None,
            ..self.clone()
        }
    }

    pub async fn report_progress(&self, percent: f64) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(percent.clamp(0.0, 100.0)).await;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub success: bool,
    pub message: String,
    pub file_path: Option<PathBuf>,
    pub file_size_bytes: Option<u64>,
    pub info: Option<VideoInfo>,
    pub error: Option<ErrorDetail>,
}

impl DownloadResult {
    pub fn success(file_path: PathBuf, file_size_bytes: u64, info: Option<VideoInfo>) -> Self {
        debug_assert!(
            !file_path.as_os_str().is_empty(),
            "successful download without a file path"
        );
        let message = match &info {
            Some(i) => format!("Downloaded '{}'", i.title),
            None => format!("Downloaded {}", file_path.display()),
        };
        Self {
            success: true,
            message,
            file_path: Some(file_path),
            file_size_bytes: Some(file_size_bytes),
            info,
            error: None,
        }
    }

    pub fn failure(err: &DownloadError) -> Self {
        let detail = ErrorDetail::from(err);
        Self {
            success: false,
            message: detail.message.clone(),
            file_path: None,
            file_size_bytes: None,
            info: None,
            error: Some(detail),
        }
    }

    pub fn with_info(mut self, info: VideoInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.is_empty() {
            self.message = message;
        }
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.info.as_ref().map(|i| i.title.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub url: String,
    pub entries: Vec<CollectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    pub subscriber_count: Option<u64>,
    pub videos: Vec<CollectionEntry>,
}
