//! Scripted backends shared by the dispatcher, batch and scheduler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use vidgrab_core::models::auth::AuthSession;
use vidgrab_core::models::media::{
    ChannelInfo, CollectionEntry, DownloadOptions, DownloadResult, PlaylistInfo, VideoInfo,
};
use vidgrab_core::{Capabilities, Capability, DownloadError, Platform, PlatformDownloader};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=PLmock";
/// Always fails with a non-retryable error.
pub const FAILING_VIDEO: &str = "https://youtu.be/failfailfai";

pub struct MockBackend {
    platform: Platform,
    caps: Capabilities,
    delay: Option<Duration>,
    fail_first: usize,
    playlist: Vec<String>,
    pub download_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Downloads started per burst of overlapping calls.
    pub chunk_sizes: Mutex<Vec<usize>>,
    pub saw_progress_sink: AtomicUsize,
    pub auth: Mutex<Option<AuthSession>>,
}

impl MockBackend {
    pub fn new(platform: Platform, caps: Capabilities) -> Self {
        Self {
            platform,
            caps,
            delay: None,
            fail_first: 0,
            playlist: vec![
                "https://youtu.be/aaaaaaaaaaa".into(),
                FAILING_VIDEO.into(),
                "https://youtu.be/bbbbbbbbbbb".into(),
            ],
            download_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            chunk_sizes: Mutex::new(Vec::new()),
            saw_progress_sink: AtomicUsize::new(0),
            auth: Mutex::new(None),
        }
    }

    /// YouTube backend with playlist, channel and authentication support.
    pub fn youtube() -> Self {
        Self::new(
            Platform::YouTube,
            Capabilities::of(&[
                Capability::Playlist,
                Capability::Channel,
                Capability::Authentication,
            ]),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The first `n` downloads fail with a retryable stream error.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn with_playlist(mut self, urls: Vec<String>) -> Self {
        self.playlist = urls;
        self
    }

    fn entries(&self) -> Vec<CollectionEntry> {
        self.playlist
            .iter()
            .enumerate()
            .map(|(i, url)| CollectionEntry {
                id: i.to_string(),
                title: format!("Entry {}", i),
                url: url.clone(),
                duration_seconds: None,
            })
            .collect()
    }

    fn track_start(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let mut chunks = self.chunk_sizes.lock().unwrap();
        match chunks.last_mut() {
            Some(last) if now > 1 => *last += 1,
            _ => chunks.push(1),
        }
    }
}

fn title_from_url(url: &str) -> String {
    url.rsplit(&['/', '='][..]).next().unwrap_or(url).to_string()
}

#[async_trait]
impl PlatformDownloader for MockBackend {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    async fn get_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        if !self.validate_url(url) {
            return Err(DownloadError::InvalidUrl {
                platform: self.platform,
                url: url.to_string(),
            });
        }
        Ok(VideoInfo {
            title: title_from_url(url),
            url: Some(url.to_string()),
            platform: Some(self.platform),
            ..Default::default()
        })
    }

    async fn download(&self, url: &str, opts: &DownloadOptions) -> DownloadResult {
        let call = self.download_calls.fetch_add(1, Ordering::SeqCst);
        if opts.progress.is_some() {
            self.saw_progress_sink.fetch_add(1, Ordering::SeqCst);
        }
        self.track_start();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url == FAILING_VIDEO {
            return DownloadResult::failure(&DownloadError::NotImplemented(self.platform));
        }
        if call < self.fail_first {
            return DownloadResult::failure(&DownloadError::Stream("connection reset".into()));
        }

        let info = match self.get_info(url).await {
            Ok(info) => info,
            Err(e) => return DownloadResult::failure(&e),
        };
        let path = opts.output_path.join(format!("{}.mp4", info.title));
        DownloadResult::success(path, 1024, Some(info))
    }

    async fn get_playlist_info(&self, url: &str) -> Result<PlaylistInfo, DownloadError> {
        Ok(PlaylistInfo {
            id: Some("PLmock".into()),
            title: "Mock Playlist".into(),
            author: None,
            url: url.to_string(),
            entries: self.entries(),
        })
    }

    async fn get_channel_info(&self, url: &str) -> Result<ChannelInfo, DownloadError> {
        Ok(ChannelInfo {
            id: None,
            name: "Mock Channel".into(),
            url: url.to_string(),
            subscriber_count: None,
            videos: self.entries(),
        })
    }

    fn set_authentication(&self, auth: AuthSession) -> Result<(), DownloadError> {
        *self.auth.lock().unwrap() = Some(auth);
        Ok(())
    }
}
