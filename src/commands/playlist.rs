use vidgrab_core::core::events::BatchProgress;
use vidgrab_core::models::media::CollectionEntry;

use super::{count_bar, print_result, spinner};
use crate::cli::MediaArgs;
use crate::AppContext;

fn print_entries(heading: &str, entries: &[CollectionEntry]) {
    println!("{} ({} entries)", heading, entries.len());
    for (i, entry) in entries.iter().enumerate() {
        match entry.duration_seconds {
            Some(secs) => println!(
                "{:>4}. {} [{}:{:02}]  {}",
                i + 1,
                entry.title,
                secs as u64 / 60,
                secs as u64 % 60,
                entry.url
            ),
            None => println!("{:>4}. {}  {}", i + 1, entry.title, entry.url),
        }
    }
}

pub async fn run(
    ctx: &AppContext,
    url: &str,
    channel: bool,
    info_only: bool,
    media: &MediaArgs,
) -> anyhow::Result<()> {
    if info_only {
        let pb = spinner("Fetching entries...");
        if channel {
            let info = ctx.dispatcher.get_channel_info(url).await;
            pb.finish_and_clear();
            let info = info?;
            print_entries(&info.name, &info.videos);
        } else {
            let info = ctx.dispatcher.get_playlist_info(url).await;
            pb.finish_and_clear();
            let info = info?;
            print_entries(&info.title, &info.entries);
        }
        return Ok(());
    }

    let opts = media.to_options(&ctx.settings.download);
    let pb = count_bar(0);
    pb.set_message(url.to_string());
    let on_progress = |p: BatchProgress| {
        pb.set_length(p.total as u64);
        pb.set_position(p.completed as u64);
    };

    let result = if channel {
        ctx.dispatcher.download_channel(url, &opts, &on_progress).await
    } else {
        ctx.dispatcher.download_playlist(url, &opts, &on_progress).await
    };
    pb.finish_and_clear();

    print_result(&result);
    Ok(())
}
