use std::path::Path;

use anyhow::Context;

use vidgrab_core::models::media::VideoInfo;

use super::spinner;
use crate::core::url_parser::parse_url;
use crate::AppContext;

fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    let (h, m, s) = (total / 3600, total % 3600 / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

fn print_info(info: &VideoInfo) {
    println!("Title:      {}", info.title);
    let fields = [
        ("Author", info.author.clone()),
        ("Platform", info.platform.map(|p| p.display_name().to_string())),
        ("Duration", info.duration_seconds.map(format_duration)),
        ("Uploaded", info.upload_date.clone()),
        ("Views", info.views.map(|v| v.to_string())),
        (
            "Size",
            info.file_size_bytes
                .map(|b| format!("{:.1} MB", b as f64 / 1_048_576.0)),
        ),
        ("URL", info.url.clone()),
        ("Thumbnail", info.thumbnail_url.clone()),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{:<11} {}", format!("{}:", label), value);
        }
    }
    let flags: Vec<&str> = [
        (info.is_live, "live"),
        (info.is_private, "private"),
        (info.age_restricted, "age restricted"),
    ]
    .into_iter()
    .filter(|(flag, _)| *flag == Some(true))
    .map(|(_, name)| name)
    .collect();
    if !flags.is_empty() {
        println!("Flags:      {}", flags.join(", "));
    }
    if let Some(description) = &info.description {
        println!("\n{}", description);
    }
}

pub async fn run(
    ctx: &AppContext,
    url: &str,
    json: bool,
    thumbnail: Option<&Path>,
) -> anyhow::Result<()> {
    let pb = spinner("Fetching media information...");
    let info = ctx.dispatcher.get_info(url).await;
    pb.finish_and_clear();
    let info = info?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        if let Some(parsed) = parse_url(url) {
            let id = parsed.content_id.as_deref().unwrap_or("-");
            println!("Content:    {} ({})", parsed.content_type, id);
        }
        print_info(&info);
    }

    if let Some(target) = thumbnail {
        let Some(thumb_url) = info.thumbnail_url.as_deref() else {
            anyhow::bail!("no thumbnail available for {}", url);
        };
        let bytes = ctx.http.download_binary(thumb_url, &[]).await?;
        tokio::fs::write(target, &bytes)
            .await
            .with_context(|| format!("writing {}", target.display()))?;
        tracing::info!("[info] thumbnail saved to {}", target.display());
    }
    Ok(())
}
