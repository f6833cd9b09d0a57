use std::path::Path;

use anyhow::Context;

use vidgrab_core::core::events::BatchProgress;

use super::count_bar;
use crate::cli::MediaArgs;
use crate::core::batch::BatchRunner;
use crate::AppContext;

/// Non-empty lines that are not `#` comments.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub async fn run(
    ctx: &AppContext,
    file: &Path,
    concurrency: Option<usize>,
    media: &MediaArgs,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let urls = parse_url_list(&contents);
    if urls.is_empty() {
        println!("No URLs in {}", file.display());
        return Ok(());
    }

    let opts = media.to_options(&ctx.settings.download);
    let concurrency = concurrency.unwrap_or(ctx.settings.batch.concurrency);
    let pb = count_bar(urls.len() as u64);

    let on_progress = |p: BatchProgress| {
        pb.set_length(p.total as u64);
        pb.set_position(p.completed as u64);
        if let Some(item) = &p.item {
            let label = item.title.as_deref().unwrap_or(&item.url);
            let mark = if item.success { "✓" } else { "✗" };
            pb.println(format!("{} {}", mark, label));
        }
    };
    let results = BatchRunner::new(&ctx.dispatcher, concurrency)
        .run(&urls, &opts, &on_progress)
        .await;
    pb.finish_and_clear();

    let succeeded = results.iter().filter(|r| r.success).count();
    let skipped = urls.len() - results.len();
    println!(
        "{} succeeded, {} failed, {} skipped (unsupported)",
        succeeded,
        results.len() - succeeded,
        skipped
    );
    for failed in results.iter().filter(|r| !r.success) {
        eprintln!("  ✗ {}", failed.message);
    }
    Ok(())
}
