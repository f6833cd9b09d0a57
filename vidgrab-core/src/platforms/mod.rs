pub mod traits;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    YouTube,
    TikTok,
    Instagram,
    Twitter,
    Facebook,
    Vimeo,
    Twitch,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static platform pattern"))
        .collect()
}

static YOUTUBE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^https?://(?:www\.|m\.|music\.)?youtube\.com/watch\?(?:.*&)?v=[\w-]{11}",
        r"^https?://youtu\.be/[\w-]{11}",
        r"^https?://(?:www\.|m\.)?youtube\.com/shorts/[\w-]{11}",
        r"^https?://(?:www\.|m\.)?youtube\.com/(?:embed|live)/[\w-]{11}",
        r"^https?://(?:www\.)?youtube-nocookie\.com/embed/[\w-]{11}",
        r"^https?://(?:www\.|m\.|music\.)?youtube\.com/playlist\?(?:.*&)?list=[\w-]+",
        r"^https?://(?:www\.|m\.)?youtube\.com/(?:@[\w.-]+|channel/[\w-]+|c/[\w.-]+|user/[\w.-]+)/?",
    ])
});

static TIKTOK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^https?://(?:www\.|m\.)?tiktok\.com/@[\w.-]+/(?:video|photo)/\d+",
        r"^https?://(?:vm|vt)\.tiktok\.com/[\w-]+",
        r"^https?://(?:www\.)?tiktok\.com/t/[\w-]+",
    ])
});

static INSTAGRAM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^https?://(?:www\.)?instagram\.com/(?:p|reel|reels|tv)/[\w-]+",
        r"^https?://(?:www\.)?instagram\.com/stories/[\w.-]+/\d+",
    ])
});

static TWITTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^https?://(?:www\.|mobile\.)?(?:twitter|x)\.com/\w+/status/\d+",
        r"^https?://t\.co/\w+",
    ])
});

static FACEBOOK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^https?://(?:www\.|m\.|web\.)?facebook\.com/[\w.-]+/videos/(?:[\w.-]+/)?\d+",
        r"^https?://(?:www\.|m\.|web\.)?facebook\.com/(?:watch/?\?v=|reel/)\d+",
        r"^https?://(?:www\.|m\.)?facebook\.com/share/[vr]/[\w-]+",
        r"^https?://fb\.watch/[\w-]+",
    ])
});

static VIMEO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^https?://(?:www\.)?vimeo\.com/(?:channels/[\w-]+/)?\d+",
        r"^https?://player\.vimeo\.com/video/\d+",
    ])
});

static TWITCH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"^https?://(?:www\.|m\.)?twitch\.tv/videos/\d+",
        r"^https?://clips\.twitch\.tv/[\w-]+",
        r"^https?://(?:www\.|m\.)?twitch\.tv/\w+/clip/[\w-]+",
        r"^https?://(?:www\.|m\.)?twitch\.tv/\w{3,25}/?$",
    ])
});

impl Platform {
    /// Classification order; the first matching platform wins.
    pub const ALL: [Platform; 7] = [
        Platform::YouTube,
        Platform::TikTok,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Facebook,
        Platform::Vimeo,
        Platform::Twitch,
    ];

    pub fn patterns(&self) -> &'static [Regex] {
        match self {
            Platform::YouTube => &YOUTUBE_PATTERNS,
            Platform::TikTok => &TIKTOK_PATTERNS,
            Platform::Instagram => &INSTAGRAM_PATTERNS,
            Platform::Twitter => &TWITTER_PATTERNS,
            Platform::Facebook => &FACEBOOK_PATTERNS,
            Platform::Vimeo => &VIMEO_PATTERNS,
            Platform::Twitch => &TWITCH_PATTERNS,
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        let url = url.trim();
        self.patterns().iter().any(|re| re.is_match(url))
    }

    pub fn from_url(url: &str) -> Option<Platform> {
        Self::ALL.into_iter().find(|p| p.matches(url))
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter",
            Platform::Facebook => "Facebook",
            Platform::Vimeo => "Vimeo",
            Platform::Twitch => "Twitch",
        }
    }
}
