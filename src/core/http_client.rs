use std::time::Duration;

use anyhow::anyhow;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};

use vidgrab_core::models::settings::{NetworkSettings, ProxySettings};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared HTTP collaborator. Every request carries the default headers,
/// with per-request overrides taking precedence.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    default_headers: HeaderMap,
}

pub fn apply_proxy(
    builder: reqwest::ClientBuilder,
    proxy: &ProxySettings,
) -> reqwest::ClientBuilder {
    let Some(proxy_url) = proxy.url() else {
        return builder;
    };
    match reqwest::Proxy::all(&proxy_url) {
        Ok(p) => builder.proxy(p),
        Err(e) => {
            tracing::warn!("Invalid proxy URL: {}", e);
            builder
        }
    }
}

impl HttpClient {
    pub fn new(network: &NetworkSettings, proxy: &ProxySettings) -> anyhow::Result<Self> {
        let builder = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10));
        let client = apply_proxy(builder, proxy).build()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_str(&network.user_agent)?);
        default_headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&network.accept_language)?,
        );

        Ok(Self {
            client,
            default_headers,
        })
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Defaults first, then overrides; names compare case-insensitively.
    pub fn merge_headers(&self, overrides: &[(String, String)]) -> HeaderMap {
        let mut merged = self.default_headers.clone();
        for (name, value) in overrides {
            let parsed = HeaderName::from_bytes(name.as_bytes())
                .ok()
                .zip(HeaderValue::from_str(value).ok());
            match parsed {
                Some((name, value)) => {
                    merged.insert(name, value);
                }
                None => tracing::warn!("[http] dropping invalid header '{}'", name),
            }
        }
        merged
    }

    pub async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> anyhow::Result<HttpResponse> {
        tracing::debug!("[http] GET {}", url);
        let response = self
            .client
            .get(url)
            .headers(self.merge_headers(headers))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    pub async fn download_binary(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> anyhow::Result<Vec<u8>> {
        tracing::debug!("[http] GET (binary) {}", url);
        let response = self
            .client
            .get(url)
            .headers(self.merge_headers(headers))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} fetching {}", status.as_u16(), url));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
