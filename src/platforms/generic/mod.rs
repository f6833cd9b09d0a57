use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use async_trait::async_trait;
use scraper::{Html, Selector};

use vidgrab_core::models::auth::AuthSession;
use vidgrab_core::models::media::{DownloadOptions, DownloadResult, VideoInfo};
use vidgrab_core::{Capabilities, Capability, DownloadError, Platform, PlatformDownloader};

use crate::core::http_client::HttpClient;

static OG_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[property^='og:']").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

/// Metadata-only backend: reads a page's OpenGraph tags and reports
/// downloads as not implemented.
pub struct OpenGraphDownloader {
    platform: Platform,
    http: HttpClient,
    caps: Capabilities,
    auth: RwLock<Option<AuthSession>>,
}

impl OpenGraphDownloader {
    pub fn new(platform: Platform, http: HttpClient) -> Self {
        Self {
            platform,
            http,
            caps: Capabilities::NONE,
            auth: RwLock::new(None),
        }
    }

    /// Pages are fetched with the stored session's cookies and token.
    pub fn with_authentication(mut self) -> Self {
        self.caps = self.caps.with(Capability::Authentication);
        self
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        let guard = match self.auth.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(session) = guard.as_ref() else {
            return Vec::new();
        };
        let mut headers = Vec::new();
        if let Some(cookie) = session.cookie_header() {
            headers.push(("Cookie".to_string(), cookie));
        }
        if let Some(token) = &session.token {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        headers
    }
}

/// `og:*` properties keyed without the prefix; the first occurrence wins.
fn og_properties(doc: &Html) -> HashMap<String, String> {
    let mut props = HashMap::new();
    for el in doc.select(&OG_META) {
        let attrs = el.value();
        let (Some(property), Some(content)) = (attrs.attr("property"), attrs.attr("content")) else {
            continue;
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }
        props
            .entry(property.trim_start_matches("og:").to_string())
            .or_insert_with(|| content.to_string());
    }
    props
}

/// `None` when the page carries neither `og:title` nor a `<title>`.
pub fn parse_open_graph(html: &str, platform: Platform) -> Option<VideoInfo> {
    let doc = Html::parse_document(html);
    let mut props = og_properties(&doc);

    let title = props.remove("title").or_else(|| {
        doc.select(&TITLE)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    })?;

    Some(VideoInfo {
        title,
        description: props.remove("description"),
        thumbnail_url: props.remove("image"),
        url: props.remove("url"),
        duration_seconds: props
            .get("video:duration")
            .and_then(|d| d.parse::<f64>().ok()),
        platform: Some(platform),
        ..Default::default()
    })
}

#[async_trait]
impl PlatformDownloader for OpenGraphDownloader {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    async fn get_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        if !self.validate_url(url) {
            return Err(DownloadError::InvalidUrl {
                platform: self.platform,
                url: url.to_string(),
            });
        }

        let response = self
            .http
            .get(url, &self.auth_headers())
            .await
            .map_err(DownloadError::fetch)?;
        if !response.is_success() {
            return Err(DownloadError::fetch(anyhow::anyhow!(
                "HTTP {} fetching {}",
                response.status,
                url
            )));
        }

        let mut info = parse_open_graph(&response.body, self.platform).ok_or_else(|| {
            DownloadError::fetch(anyhow::anyhow!("no title found on {}", url))
        })?;
        if info.url.is_none() {
            info.url = Some(url.to_string());
        }
        Ok(info)
    }

    async fn download(&self, url: &str, _opts: &DownloadOptions) -> DownloadResult {
        match self.get_info(url).await {
            Ok(info) => {
                tracing::debug!("[{}] fetched '{}', media download unavailable", self.platform, info.title);
                DownloadResult::failure(&DownloadError::NotImplemented(self.platform)).with_info(info)
            }
            Err(e) => DownloadResult::failure(&e),
        }
    }

    fn set_authentication(&self, auth: AuthSession) -> Result<(), DownloadError> {
        if !self.supports(Capability::Authentication) {
            return Err(DownloadError::AuthNotSupported(self.platform));
        }
        let mut guard = match self.auth.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(auth);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidgrab_core::models::settings::{NetworkSettings, ProxySettings};

    const PAGE: &str = r#"<!doctype html>
<html><head>
  <title>Fallback title</title>
  <meta property="og:title" content="Clip of the day">
  <meta property="og:description" content="Something happened">
  <meta property="og:image" content="https://cdn.example/thumb.jpg">
  <meta property="og:url" content="https://vimeo.com/123456">
  <meta property="og:video:duration" content="93">
  <meta property="og:title" content="Second title">
</head><body></body></html>"#;

    fn backend(platform: Platform) -> OpenGraphDownloader {
        let http = HttpClient::new(&NetworkSettings::default(), &ProxySettings::default()).unwrap();
        OpenGraphDownloader::new(platform, http)
    }

    #[test]
    fn reads_open_graph_tags() {
        let info = parse_open_graph(PAGE, Platform::Vimeo).unwrap();
        assert_eq!(info.title, "Clip of the day");
        assert_eq!(info.description.as_deref(), Some("Something happened"));
        assert_eq!(info.thumbnail_url.as_deref(), Some("https://cdn.example/thumb.jpg"));
        assert_eq!(info.url.as_deref(), Some("https://vimeo.com/123456"));
        assert_eq!(info.duration_seconds, Some(93.0));
        assert_eq!(info.platform, Some(Platform::Vimeo));
    }

    #[test]
    fn falls_back_to_title_element() {
        let html = "<html><head><title> Just a page </title></head></html>";
        let info = parse_open_graph(html, Platform::TikTok).unwrap();
        assert_eq!(info.title, "Just a page");
        assert!(info.description.is_none());

        assert!(parse_open_graph("<html><body>nothing</body></html>", Platform::TikTok).is_none());
    }

    #[tokio::test]
    async fn foreign_url_is_invalid() {
        let err = backend(Platform::Twitch)
            .get_info("https://vimeo.com/123456")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl { platform: Platform::Twitch, .. }));
    }

    #[test]
    fn authentication_only_when_enabled() {
        let plain = backend(Platform::Twitter);
        assert!(matches!(
            plain.set_authentication(AuthSession::new(Platform::Twitter)),
            Err(DownloadError::AuthNotSupported(Platform::Twitter))
        ));

        let insta = backend(Platform::Instagram).with_authentication();
        let mut session = AuthSession::new(Platform::Instagram);
        session.cookies.push(("sessionid".into(), "abc".into()));
        session.token = Some("tok".into());
        insta.set_authentication(session).unwrap();
        assert_eq!(
            insta.auth_headers(),
            vec![
                ("Cookie".to_string(), "sessionid=abc".to_string()),
                ("Authorization".to_string(), "Bearer tok".to_string()),
            ]
        );
    }
}
