use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::platforms::Platform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub platform: Platform,
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    #[serde(default)]
    pub cookies: Vec<(String, String)>,
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthSession {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            cookies_file: None,
            cookies: Vec::new(),
            token: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies_file.is_none() && self.cookies.is_empty() && self.token.is_none()
    }

    /// `name=value; name2=value2`, or `None` without inline cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
