use vidgrab_core::models::media::DownloadOptions;

use super::{print_result, PercentBar};
use crate::cli::MediaArgs;
use crate::AppContext;

pub async fn run(ctx: &AppContext, url: &str, media: &MediaArgs) -> anyhow::Result<()> {
    let (bar, progress) = PercentBar::start(url.to_string());
    let opts = DownloadOptions {
        progress: Some(progress),
        ..media.to_options(&ctx.settings.download)
    };

    let result = ctx.dispatcher.download(url, &opts).await;
    drop(opts);
    bar.finish().await;

    print_result(&result);
    Ok(())
}
