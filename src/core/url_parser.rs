use serde::Serialize;

use vidgrab_core::Platform;

#[derive(Debug, Clone, Serialize)]
pub struct ParsedUrl {
    pub platform: Platform,
    pub url: String,
    pub content_id: Option<String>,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentType {
    Video,
    Short,
    Playlist,
    Channel,
    Reel,
    Post,
    Clip,
    Live,
    ShortLink,
    Unknown,
}

impl ContentType {
    /// Whether the URL names a collection rather than a single item.
    pub fn is_collection(&self) -> bool {
        matches!(self, ContentType::Playlist | ContentType::Channel)
    }
}

pub fn parse_url(url_str: &str) -> Option<ParsedUrl> {
    let url_str = url_str.trim();
    let platform = Platform::from_url(url_str)?;
    let parsed = url::Url::parse(url_str).ok()?;
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();

    let (content_id, content_type) = match platform {
        Platform::YouTube => parse_youtube(&parsed, &host, &segments),
        Platform::TikTok => parse_tiktok(&host, &segments),
        Platform::Instagram => parse_instagram(&segments),
        Platform::Twitter => parse_twitter(&host, &segments),
        Platform::Facebook => parse_facebook(&parsed, &host, &segments),
        Platform::Vimeo => parse_vimeo(&segments),
        Platform::Twitch => parse_twitch(&host, &segments),
    };

    Some(ParsedUrl {
        platform,
        url: url_str.to_string(),
        content_id,
        content_type,
    })
}

fn query_param(parsed: &url::Url, key: &str) -> Option<String> {
    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.to_string())
}

fn segment(segments: &[&str], idx: usize) -> Option<String> {
    segments.get(idx).map(|s| s.to_string())
}

fn parse_youtube(
    parsed: &url::Url,
    host: &str,
    segments: &[&str],
) -> (Option<String>, ContentType) {
    if host == "youtu.be" {
        return (segment(segments, 0), ContentType::Video);
    }

    match segments.first() {
        Some(&"watch") => (query_param(parsed, "v"), ContentType::Video),
        Some(&"shorts") => (segment(segments, 1), ContentType::Short),
        Some(&"live") => (segment(segments, 1), ContentType::Live),
        Some(&"embed") => (segment(segments, 1), ContentType::Video),
        Some(&"playlist") => (query_param(parsed, "list"), ContentType::Playlist),
        Some(&"channel") | Some(&"c") | Some(&"user") => {
            (segment(segments, 1), ContentType::Channel)
        }
        Some(handle) if handle.starts_with('@') => (Some(handle.to_string()), ContentType::Channel),
        _ => (None, ContentType::Unknown),
    }
}

fn parse_tiktok(host: &str, segments: &[&str]) -> (Option<String>, ContentType) {
    if host.starts_with("vm.") || host.starts_with("vt.") {
        return (segment(segments, 0), ContentType::ShortLink);
    }
    if segments.first() == Some(&"t") {
        return (segment(segments, 1), ContentType::ShortLink);
    }
    match segments.get(1) {
        Some(&"video") => (segment(segments, 2), ContentType::Video),
        Some(&"photo") => (segment(segments, 2), ContentType::Post),
        _ => (None, ContentType::Unknown),
    }
}

fn parse_instagram(segments: &[&str]) -> (Option<String>, ContentType) {
    match segments.first() {
        Some(&"p") => (segment(segments, 1), ContentType::Post),
        Some(&"reel") | Some(&"reels") => (segment(segments, 1), ContentType::Reel),
        Some(&"tv") => (segment(segments, 1), ContentType::Video),
        Some(&"stories") => (segment(segments, 2), ContentType::Post),
        _ => (None, ContentType::Unknown),
    }
}

fn parse_twitter(host: &str, segments: &[&str]) -> (Option<String>, ContentType) {
    if host == "t.co" {
        return (segment(segments, 0), ContentType::ShortLink);
    }
    if segments.get(1) == Some(&"status") {
        return (segment(segments, 2), ContentType::Post);
    }
    (None, ContentType::Unknown)
}

fn parse_facebook(
    parsed: &url::Url,
    host: &str,
    segments: &[&str],
) -> (Option<String>, ContentType) {
    if host == "fb.watch" {
        return (segment(segments, 0), ContentType::ShortLink);
    }
    match segments.first() {
        Some(&"watch") => (query_param(parsed, "v"), ContentType::Video),
        Some(&"reel") => (segment(segments, 1), ContentType::Reel),
        Some(&"share") => (segment(segments, 2), ContentType::ShortLink),
        _ if segments.get(1) == Some(&"videos") => {
            (segments.last().map(|s| s.to_string()), ContentType::Video)
        }
        _ => (None, ContentType::Unknown),
    }
}

fn parse_vimeo(segments: &[&str]) -> (Option<String>, ContentType) {
    segments
        .iter()
        .rev()
        .find(|s| s.chars().all(|c| c.is_ascii_digit()))
        .map(|id| (Some(id.to_string()), ContentType::Video))
        .unwrap_or((None, ContentType::Unknown))
}

fn parse_twitch(host: &str, segments: &[&str]) -> (Option<String>, ContentType) {
    if host == "clips.twitch.tv" {
        return (segment(segments, 0), ContentType::Clip);
    }
    match (segments.first(), segments.get(1)) {
        (Some(&"videos"), _) => (segment(segments, 1), ContentType::Video),
        (Some(_), Some(&"clip")) => (segment(segments, 2), ContentType::Clip),
        (Some(channel), None) => (Some(channel.to_string()), ContentType::Live),
        _ => (None, ContentType::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(url: &str) -> (Platform, Option<String>, ContentType) {
        let p = parse_url(url).unwrap();
        (p.platform, p.content_id, p.content_type)
    }

    #[test]
    fn youtube_shapes() {
        assert_eq!(
            parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10"),
            (Platform::YouTube, Some("dQw4w9WgXcQ".into()), ContentType::Video)
        );
        assert_eq!(
            parse("https://youtu.be/dQw4w9WgXcQ").1.as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(parse("https://www.youtube.com/shorts/abcdefghijk").2, ContentType::Short);
        assert_eq!(
            parse("https://www.youtube.com/playlist?list=PLabc"),
            (Platform::YouTube, Some("PLabc".into()), ContentType::Playlist)
        );
        assert_eq!(
            parse("https://www.youtube.com/@LinusTechTips"),
            (Platform::YouTube, Some("@LinusTechTips".into()), ContentType::Channel)
        );
        assert_eq!(parse("https://www.youtube.com/live/dQw4w9WgXcQ").2, ContentType::Live);
    }

    #[test]
    fn short_links() {
        assert_eq!(parse("https://vm.tiktok.com/ZMabc123/").2, ContentType::ShortLink);
        assert_eq!(parse("https://fb.watch/abcDEF123/").2, ContentType::ShortLink);
        assert_eq!(parse("https://t.co/xyz").2, ContentType::ShortLink);
    }

    #[test]
    fn other_platform_ids() {
        assert_eq!(
            parse("https://www.tiktok.com/@scout2015/video/6718335390845095173").1.as_deref(),
            Some("6718335390845095173")
        );
        assert_eq!(parse("https://www.instagram.com/reel/CxYz123AbC/").2, ContentType::Reel);
        assert_eq!(
            parse("https://x.com/jack/status/20"),
            (Platform::Twitter, Some("20".into()), ContentType::Post)
        );
        assert_eq!(
            parse("https://www.facebook.com/watch/?v=1234567890").1.as_deref(),
            Some("1234567890")
        );
        assert_eq!(
            parse("https://www.facebook.com/somepage/videos/987654321").1.as_deref(),
            Some("987654321")
        );
        assert_eq!(
            parse("https://vimeo.com/channels/staffpicks/76979871").1.as_deref(),
            Some("76979871")
        );
        assert_eq!(parse("https://clips.twitch.tv/FunnyClipName-abc").2, ContentType::Clip);
        assert_eq!(
            parse("https://www.twitch.tv/shroud"),
            (Platform::Twitch, Some("shroud".into()), ContentType::Live)
        );
    }

    #[test]
    fn collections() {
        assert!(ContentType::Playlist.is_collection());
        assert!(ContentType::Channel.is_collection());
        assert!(!ContentType::Video.is_collection());
    }

    #[test]
    fn unsupported_returns_none() {
        assert!(parse_url("https://example.com/video/1").is_none());
    }
}
