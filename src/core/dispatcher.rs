use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;

use vidgrab_core::core::events::BatchProgress;
use vidgrab_core::models::auth::AuthSession;
use vidgrab_core::models::media::{
    ChannelInfo, DownloadOptions, DownloadResult, PlaylistInfo, VideoInfo,
};
use vidgrab_core::models::settings::{RetryPolicy, DEFAULT_BATCH_CONCURRENCY};
use vidgrab_core::{Capability, DownloadError, Platform, PlatformDownloader};

use crate::core::batch::BatchRunner;
use crate::core::filename::sanitize_path_component;

/// Callback receiving one [`BatchProgress`] per finished item.
pub type ProgressCallback<'a> = &'a (dyn Fn(BatchProgress) + Send + Sync);

/// Routes every operation to the backend owning the URL's platform.
///
/// The backend table is fixed once the dispatcher is built; share it behind an `Arc`.
pub struct Dispatcher {
    backends: HashMap<Platform, Arc<dyn PlatformDownloader>>,
    retry: RetryPolicy,
    concurrency: usize,
}

impl Dispatcher {
    pub fn new(backends: Vec<Arc<dyn PlatformDownloader>>) -> Self {
        let mut table = HashMap::new();
        for backend in backends {
            if let Some(previous) = table.insert(backend.platform(), backend) {
                tracing::warn!("[dispatcher] replacing backend {}", previous.name());
            }
        }
        Self {
            backends: table,
            retry: RetryPolicy::no_retry(),
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn classify(&self, url: &str) -> Option<Platform> {
        Platform::from_url(url)
    }

    pub fn is_supported(&self, url: &str) -> bool {
        self.backend_for(url).is_ok()
    }

    /// Registered backends in classification order.
    pub fn backends(&self) -> Vec<Arc<dyn PlatformDownloader>> {
        Platform::ALL
            .iter()
            .filter_map(|p| self.backends.get(p).cloned())
            .collect()
    }

    pub fn backend(&self, platform: Platform) -> Option<Arc<dyn PlatformDownloader>> {
        self.backends.get(&platform).cloned()
    }

    fn backend_for(&self, url: &str) -> Result<&Arc<dyn PlatformDownloader>, DownloadError> {
        self.classify(url)
            .and_then(|p| self.backends.get(&p))
            .ok_or_else(|| DownloadError::UnsupportedUrl(url.trim().to_string()))
    }

    fn capable_backend(
        &self,
        url: &str,
        cap: Capability,
    ) -> Result<&Arc<dyn PlatformDownloader>, DownloadError> {
        let backend = self.backend_for(url)?;
        if !backend.supports(cap) {
            return Err(DownloadError::NotSupported(cap));
        }
        Ok(backend)
    }

    pub async fn get_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let backend = self.backend_for(url)?;
        tracing::debug!("[dispatcher] get_info via {}: {}", backend.name(), url);
        backend.get_info(url.trim()).await
    }

    pub async fn download(&self, url: &str, opts: &DownloadOptions) -> DownloadResult {
        let backend = match self.backend_for(url) {
            Ok(b) => b,
            Err(e) => return DownloadResult::failure(&e),
        };
        let url = url.trim();

        let mut attempt = 0;
        loop {
            let result = backend.download(url, opts).await;
            if result.success {
                return result;
            }

            let retryable = result
                .error
                .as_ref()
                .is_some_and(|e| e.kind.is_retryable());
            if !retryable || !self.retry.should_retry(attempt) {
                return result;
            }

            let delay = self.retry.delay_for_attempt(attempt);
            tracing::warn!(
                "[dispatcher] attempt {}/{} for {} failed: {}; retrying in {:?}",
                attempt + 1,
                self.retry.max_retries + 1,
                url,
                result.message,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    pub async fn get_playlist_info(&self, url: &str) -> Result<PlaylistInfo, DownloadError> {
        self.capable_backend(url, Capability::Playlist)?
            .get_playlist_info(url.trim())
            .await
    }

    pub async fn get_channel_info(&self, url: &str) -> Result<ChannelInfo, DownloadError> {
        self.capable_backend(url, Capability::Channel)?
            .get_channel_info(url.trim())
            .await
    }

    pub async fn download_playlist(
        &self,
        url: &str,
        opts: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> DownloadResult {
        match self.get_playlist_info(url).await {
            Ok(playlist) => {
                let urls: Vec<String> = playlist.entries.into_iter().map(|e| e.url).collect();
                self.download_collection(&playlist.title, &urls, opts, on_progress)
                    .await
            }
            Err(e) => DownloadResult::failure(&e),
        }
    }

    pub async fn download_channel(
        &self,
        url: &str,
        opts: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> DownloadResult {
        match self.get_channel_info(url).await {
            Ok(channel) => {
                let urls: Vec<String> = channel.videos.into_iter().map(|e| e.url).collect();
                self.download_collection(&channel.name, &urls, opts, on_progress)
                    .await
            }
            Err(e) => DownloadResult::failure(&e),
        }
    }

    /// Downloads every entry into `<output_path>/<title>`; succeeds if any entry did.
    async fn download_collection(
        &self,
        title: &str,
        urls: &[String],
        opts: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> DownloadResult {
        let dir = opts.output_path.join(sanitize_path_component(title));
        let entry_opts = DownloadOptions {
            output_path: dir.clone(),
            file_name: None,
            ..opts.without_progress()
        };
        tracing::info!("[dispatcher] downloading {} entries of '{}'", urls.len(), title);

        let results = self.batch_download(urls, &entry_opts, on_progress).await;
        let succeeded = results.iter().filter(|r| r.success).count();
        if succeeded == 0 {
            let err = DownloadError::fetch(anyhow!(
                "none of the {} entries in '{}' could be downloaded",
                urls.len(),
                title
            ));
            return DownloadResult::failure(&err);
        }

        let bytes = results.iter().filter_map(|r| r.file_size_bytes).sum();
        DownloadResult::success(dir, bytes, None).with_message(format!(
            "Downloaded {}/{} entries of '{}'",
            succeeded,
            results.len(),
            title
        ))
    }

    pub async fn record_live_stream(&self, url: &str, opts: &DownloadOptions) -> DownloadResult {
        match self.capable_backend(url, Capability::LiveRecording) {
            Ok(backend) => backend.record_live_stream(url.trim(), opts).await,
            Err(e) => DownloadResult::failure(&e),
        }
    }

    pub fn set_authentication(
        &self,
        platform: Platform,
        auth: AuthSession,
    ) -> Result<(), DownloadError> {
        match self.backends.get(&platform) {
            Some(backend) if backend.supports(Capability::Authentication) => {
                backend.set_authentication(auth)
            }
            _ => Err(DownloadError::AuthNotSupported(platform)),
        }
    }

    pub async fn batch_download(
        &self,
        urls: &[String],
        opts: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> Vec<DownloadResult> {
        BatchRunner::new(self, self.concurrency)
            .run(urls, opts, on_progress)
            .await
    }
}
