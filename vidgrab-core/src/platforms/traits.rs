use async_trait::async_trait;
use serde::Serialize;

use crate::error::DownloadError;
use crate::models::auth::AuthSession;
use crate::models::media::{ChannelInfo, DownloadOptions, DownloadResult, PlaylistInfo, VideoInfo};
use crate::platforms::Platform;

/// Optional operations a backend may or may not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum Capability {
    Playlist,
    Channel,
    Authentication,
    #[strum(to_string = "Live recording")]
    LiveRecording,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Playlist,
        Capability::Channel,
        Capability::Authentication,
        Capability::LiveRecording,
    ];

    const fn bit(self) -> u8 {
        match self {
            Capability::Playlist => 1,
            Capability::Channel => 1 << 1,
            Capability::Authentication => 1 << 2,
            Capability::LiveRecording => 1 << 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);

    pub const fn of(caps: &[Capability]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < caps.len() {
            bits |= caps[i].bit();
            i += 1;
        }
        Capabilities(bits)
    }

    pub const fn with(self, cap: Capability) -> Self {
        Capabilities(self.0 | cap.bit())
    }

    pub const fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

#[async_trait]
pub trait PlatformDownloader: Send + Sync {
    fn platform(&self) -> Platform;

    fn name(&self) -> &str {
        self.platform().display_name()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn supports(&self, cap: Capability) -> bool {
        self.capabilities().contains(cap)
    }

    fn validate_url(&self, url: &str) -> bool {
        self.platform().matches(url)
    }

    async fn get_info(&self, url: &str) -> Result<VideoInfo, DownloadError>;

    /// Every failure is reported through the returned result.
    async fn download(&self, url: &str, opts: &DownloadOptions) -> DownloadResult;

    async fn get_playlist_info(&self, _url: &str) -> Result<PlaylistInfo, DownloadError> {
        Err(DownloadError::NotSupported(Capability::Playlist))
    }

    async fn get_channel_info(&self, _url: &str) -> Result<ChannelInfo, DownloadError> {
        Err(DownloadError::NotSupported(Capability::Channel))
    }

    fn set_authentication(&self, _auth: AuthSession) -> Result<(), DownloadError> {
        Err(DownloadError::AuthNotSupported(self.platform()))
    }

    async fn record_live_stream(&self, _url: &str, _opts: &DownloadOptions) -> DownloadResult {
        DownloadResult::failure(&DownloadError::NotSupported(Capability::LiveRecording))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_bits_are_independent() {
        let caps = Capabilities::of(&[Capability::Playlist, Capability::Authentication]);
        assert!(caps.contains(Capability::Playlist));
        assert!(caps.contains(Capability::Authentication));
        assert!(!caps.contains(Capability::Channel));
        assert!(!caps.contains(Capability::LiveRecording));
        assert_eq!(
            caps.iter().collect::<Vec<_>>(),
            vec![Capability::Playlist, Capability::Authentication]
        );
    }

    #[test]
    fn none_supports_nothing() {
        assert!(Capability::ALL.iter().all(|c| !Capabilities::NONE.contains(*c)));
        assert!(Capabilities::NONE.with(Capability::Channel).contains(Capability::Channel));
    }

    #[test]
    fn live_recording_label() {
        assert_eq!(Capability::LiveRecording.to_string(), "Live recording");
    }
}
