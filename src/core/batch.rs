use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;

use vidgrab_core::core::events::{BatchItemInfo, BatchProgress};
use vidgrab_core::models::media::{DownloadOptions, DownloadResult};

use crate::core::dispatcher::{Dispatcher, ProgressCallback};

/// Runs downloads in sequential chunks of `concurrency`; members of a chunk
/// are polled concurrently on the calling task.
pub struct BatchRunner<'a> {
    dispatcher: &'a Dispatcher,
    concurrency: usize,
}

impl<'a> BatchRunner<'a> {
    pub fn new(dispatcher: &'a Dispatcher, concurrency: usize) -> Self {
        Self {
            dispatcher,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(
        &self,
        urls: &[String],
        opts: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> Vec<DownloadResult> {
        let supported: Vec<&str> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| {
                let ok = self.dispatcher.is_supported(u);
                if !ok {
                    tracing::warn!("[batch] skipping unsupported url: {}", u);
                }
                ok
            })
            .collect();

        if supported.is_empty() {
            return Vec::new();
        }

        let total = supported.len();
        let item_opts = opts.without_progress();
        let completed = AtomicUsize::new(0);
        let mut results = Vec::with_capacity(total);

        tracing::info!(
            "[batch] {} urls in chunks of {}",
            total,
            self.concurrency
        );

        for chunk in supported.chunks(self.concurrency) {
            let downloads = chunk.iter().map(|url| {
                let item_opts = &item_opts;
                let completed = &completed;
                async move {
                    let result = self.dispatcher.download(url, item_opts).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if !result.success {
                        tracing::warn!("[batch] {} failed: {}", url, result.message);
                    }
                    on_progress(BatchProgress::new(
                        done,
                        total,
                        Some(BatchItemInfo {
                            url: url.to_string(),
                            success: result.success,
                            title: result.title().map(str::to_string),
                        }),
                    ));
                    result
                }
            });
            results.extend(join_all(downloads).await);
        }

        results
    }
}
