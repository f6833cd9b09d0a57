use vidgrab_core::models::media::{DownloadOptions, Format, Quality};

/// Which elementary streams the output should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFilter {
    AudioOnly,
    VideoOnly,
    AudioVideo,
}

/// A yt-dlp `-f` expression plus the stream filter it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSelector {
    pub format: String,
    pub filter: StreamFilter,
}

fn stream_filter(opts: &DownloadOptions) -> StreamFilter {
    if !opts.include_audio && !opts.include_video {
        return StreamFilter::AudioVideo;
    }
    if opts.quality == Quality::AudioOnly || opts.format.is_audio() || !opts.include_video {
        StreamFilter::AudioOnly
    } else if !opts.include_audio {
        StreamFilter::VideoOnly
    } else {
        StreamFilter::AudioVideo
    }
}

fn ext_filter(format: Format, filter: StreamFilter) -> Option<&'static str> {
    match (filter, format) {
        (StreamFilter::AudioOnly, Format::M4a | Format::Mp4) => Some("[ext=m4a]"),
        (StreamFilter::AudioOnly, Format::Webm) => Some("[ext=webm]"),
        (StreamFilter::AudioOnly, _) => None,
        (_, Format::Mp4) => Some("[ext=mp4]"),
        (_, Format::Webm) => Some("[ext=webm]"),
        _ => None,
    }
}

fn height_filter(quality: Quality, filter: StreamFilter) -> Option<&'static str> {
    if filter == StreamFilter::AudioOnly {
        return None;
    }
    match quality {
        Quality::Hd => Some("[height>=720]"),
        Quality::Sd => Some("[height<=480]"),
        _ => None,
    }
}

/// Builds a fallback chain of single-file formats, most specific first.
/// Merged formats are never selected since output goes to a pipe.
pub fn resolve_selector(opts: &DownloadOptions) -> MediaSelector {
    let filter = stream_filter(opts);
    let worst = opts.quality == Quality::Lowest;
    let base = match (filter, worst) {
        (StreamFilter::AudioOnly, false) => "ba",
        (StreamFilter::AudioOnly, true) => "wa",
        (StreamFilter::VideoOnly, false) => "bv",
        (StreamFilter::VideoOnly, true) => "wv",
        (StreamFilter::AudioVideo, false) => "b",
        (StreamFilter::AudioVideo, true) => "w",
    };
    let height = height_filter(opts.quality, filter).unwrap_or("");
    let ext = ext_filter(opts.format, filter).unwrap_or("");

    let mut chain: Vec<String> = Vec::new();
    for candidate in [
        format!("{}{}{}", base, height, ext),
        format!("{}{}", base, height),
        base.to_string(),
    ] {
        if !chain.contains(&candidate) {
            chain.push(candidate);
        }
    }
    if filter == StreamFilter::AudioOnly {
        chain.push(if worst { "w" } else { "b" }.to_string());
    }

    MediaSelector {
        format: chain.join("/"),
        filter,
    }
}
