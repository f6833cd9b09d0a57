use super::{print_result, spinner};
use crate::cli::MediaArgs;
use crate::AppContext;

pub async fn run(ctx: &AppContext, url: &str, media: &MediaArgs) -> anyhow::Result<()> {
    let pb = spinner(format!("Recording {}", url));
    let result = ctx
        .dispatcher
        .record_live_stream(url, &media.to_options(&ctx.settings.download))
        .await;
    pb.finish_and_clear();

    print_result(&result);
    Ok(())
}
