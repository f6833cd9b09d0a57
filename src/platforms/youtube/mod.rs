mod selector;

pub use selector::{resolve_selector, MediaSelector, StreamFilter};

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use vidgrab_core::models::auth::AuthSession;
use vidgrab_core::models::media::{
    ChannelInfo, CollectionEntry, DownloadOptions, DownloadResult, PlaylistInfo, VideoInfo,
};
use vidgrab_core::{Capabilities, Capability, DownloadError, Platform, PlatformDownloader};

use crate::core::filename::resolve_file_name;
use crate::core::media_stream::{part_path_for, write_stream};
use crate::core::url_parser::parse_url;
use crate::core::ytdlp::{auth_args, YtDlp};

const CAPABILITIES: Capabilities = Capabilities::of(&[
    Capability::Playlist,
    Capability::Channel,
    Capability::Authentication,
]);

pub struct YouTubeDownloader {
    ytdlp: Arc<YtDlp>,
    stall_timeout: Duration,
    auth: RwLock<Option<AuthSession>>,
}

impl YouTubeDownloader {
    pub fn new(ytdlp: Arc<YtDlp>, stall_timeout: Duration) -> Self {
        Self {
            ytdlp,
            stall_timeout,
            auth: RwLock::new(None),
        }
    }

    fn extra_args(&self) -> Vec<String> {
        match self.auth.read() {
            Ok(guard) => guard.as_ref().map(auth_args).unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().as_ref().map(auth_args).unwrap_or_default(),
        }
    }

    fn invalid(url: &str) -> DownloadError {
        DownloadError::InvalidUrl {
            platform: Platform::YouTube,
            url: url.to_string(),
        }
    }

    async fn fetch_collection(&self, url: &str) -> Result<(Value, Vec<CollectionEntry>), DownloadError> {
        if !self.validate_url(url) {
            return Err(Self::invalid(url));
        }
        let values = self
            .ytdlp
            .fetch_collection(url, &self.extra_args())
            .await
            .map_err(DownloadError::fetch)?;
        let entries: Vec<CollectionEntry> = values.iter().filter_map(parse_entry).collect();
        if entries.is_empty() {
            return Err(DownloadError::fetch(anyhow::anyhow!(
                "no entries found at {}",
                url
            )));
        }
        let first = values.into_iter().next().unwrap_or(Value::Null);
        Ok((first, entries))
    }

    async fn stream_to_file(
        &self,
        url: &str,
        opts: &DownloadOptions,
        info: VideoInfo,
    ) -> Result<DownloadResult, DownloadError> {
        let selector = resolve_selector(opts);
        tokio::fs::create_dir_all(&opts.output_path).await?;
        let file_name = resolve_file_name(opts.file_name.as_deref(), &info.title, opts.format);
        let output = opts.output_path.join(file_name);
        let part = part_path_for(&output);

        let mut stream = self
            .ytdlp
            .open_media_stream(url, &selector.format, &self.extra_args())
            .await
            .map_err(|e| DownloadError::Stream(e.to_string()))?;

        let written = write_stream(
            &mut stream.stdout,
            &part,
            info.file_size_bytes,
            opts.progress.as_ref(),
            self.stall_timeout,
        )
        .await?;

        if let Err(e) = stream.finish().await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(DownloadError::Stream(e.to_string()));
        }
        if written == 0 {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(DownloadError::Stream("yt-dlp produced no data".into()));
        }

        tokio::fs::rename(&part, &output).await?;
        opts.report_progress(100.0).await;
        tracing::info!("[youtube] saved {} ({} bytes)", output.display(), written);

        Ok(DownloadResult::success(output, written, Some(info)))
    }
}

fn str_field(json: &Value, key: &str) -> Option<String> {
    json.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// `20091025` -> `2009-10-25`; anything else passes through unchanged.
fn format_upload_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_string()
    }
}

pub fn parse_video_info(json: &Value) -> VideoInfo {
    let url = str_field(json, "webpage_url").or_else(|| {
        str_field(json, "id").map(|id| format!("https://www.youtube.com/watch?v={}", id))
    });

    VideoInfo {
        title: str_field(json, "title").unwrap_or_else(|| "video".to_string()),
        description: str_field(json, "description"),
        duration_seconds: json.get("duration").and_then(|v| v.as_f64()),
        thumbnail_url: str_field(json, "thumbnail"),
        author: str_field(json, "uploader").or_else(|| str_field(json, "channel")),
        url,
        platform: Some(Platform::YouTube),
        upload_date: str_field(json, "upload_date").map(|d| format_upload_date(&d)),
        views: json.get("view_count").and_then(|v| v.as_u64()),
        file_size_bytes: json
            .get("filesize")
            .and_then(|v| v.as_u64())
            .or_else(|| json.get("filesize_approx").and_then(|v| v.as_u64())),
        is_live: json.get("is_live").and_then(|v| v.as_bool()),
        is_private: json
            .get("availability")
            .and_then(|v| v.as_str())
            .map(|a| a == "private"),
        age_restricted: json
            .get("age_limit")
            .and_then(|v| v.as_u64())
            .map(|limit| limit >= 18),
    }
}

fn parse_entry(json: &Value) -> Option<CollectionEntry> {
    let id = str_field(json, "id")?;
    let url = str_field(json, "url")
        .filter(|u| u.starts_with("http"))
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", id));
    Some(CollectionEntry {
        title: str_field(json, "title").unwrap_or_else(|| id.clone()),
        id,
        url,
        duration_seconds: json.get("duration").and_then(|v| v.as_f64()),
    })
}

/// Channel roots list tabs rather than uploads; point them at `/videos`.
pub fn channel_videos_url(url: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(url.trim()) else {
        return url.to_string();
    };
    let segments: Vec<String> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let is_root = match segments.as_slice() {
        [handle] => handle.starts_with('@'),
        [kind, _] => matches!(kind.as_str(), "channel" | "c" | "user"),
        _ => false,
    };
    if is_root {
        parsed.set_path(&format!("/{}/videos", segments.join("/")));
    }
    parsed.to_string()
}

#[async_trait]
impl PlatformDownloader for YouTubeDownloader {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    async fn get_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let parsed = parse_url(url)
            .filter(|p| p.platform == Platform::YouTube)
            .ok_or_else(|| Self::invalid(url))?;
        if parsed.content_type.is_collection() {
            return Err(Self::invalid(url));
        }

        let json = self
            .ytdlp
            .fetch_metadata(url, &self.extra_args())
            .await
            .map_err(DownloadError::fetch)?;
        Ok(parse_video_info(&json))
    }

    async fn download(&self, url: &str, opts: &DownloadOptions) -> DownloadResult {
        let info = match self.get_info(url).await {
            Ok(info) => info,
            Err(e) => return DownloadResult::failure(&e),
        };
        match self.stream_to_file(url, opts, info.clone()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("[youtube] {} failed: {}", url, e);
                DownloadResult::failure(&e).with_info(info)
            }
        }
    }

    async fn get_playlist_info(&self, url: &str) -> Result<PlaylistInfo, DownloadError> {
        let (first, entries) = self.fetch_collection(url).await?;
        Ok(PlaylistInfo {
            id: str_field(&first, "playlist_id"),
            title: str_field(&first, "playlist_title")
                .or_else(|| str_field(&first, "playlist"))
                .unwrap_or_else(|| "playlist".to_string()),
            author: str_field(&first, "playlist_uploader")
                .or_else(|| str_field(&first, "channel")),
            url: url.to_string(),
            entries,
        })
    }

    async fn get_channel_info(&self, url: &str) -> Result<ChannelInfo, DownloadError> {
        let listing = channel_videos_url(url);
        let (first, videos) = self.fetch_collection(&listing).await?;
        Ok(ChannelInfo {
            id: str_field(&first, "channel_id").or_else(|| str_field(&first, "playlist_channel_id")),
            name: str_field(&first, "channel")
                .or_else(|| str_field(&first, "playlist_uploader"))
                .or_else(|| str_field(&first, "uploader"))
                .unwrap_or_else(|| "channel".to_string()),
            url: url.to_string(),
            subscriber_count: first.get("channel_follower_count").and_then(|v| v.as_u64()),
            videos,
        })
    }

    fn set_authentication(&self, auth: AuthSession) -> Result<(), DownloadError> {
        let mut guard = match self.auth.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(auth);
        Ok(())
    }
}
