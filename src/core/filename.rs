use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use vidgrab_core::models::media::Format;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const FALLBACK_NAME: &str = "video";

fn is_forbidden(c: char) -> bool {
    FORBIDDEN.contains(&c) || (c.is_control() && c != '\t' && c != '\n')
}

/// Forbidden path characters become `-`, whitespace runs become `_`.
pub fn sanitize_path_component(name: &str) -> String {
    let name: String = name.nfc().collect();
    let name = name.trim();

    let replaced: String = name
        .chars()
        .map(|c| if is_forbidden(c) { '-' } else { c })
        .collect();

    let result = WS_RE.replace_all(&replaced, "_").to_string();
    if result.is_empty() || result.chars().all(|c| c == '.') {
        return FALLBACK_NAME.to_string();
    }
    result
}

pub fn default_file_name(title: &str, format: Format) -> String {
    format!("{}.{}", sanitize_path_component(title), format.extension())
}

/// Uses the caller's name when given, appending the format extension if it has none.
pub fn resolve_file_name(explicit: Option<&str>, title: &str, format: Format) -> String {
    match explicit.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => {
            let name = sanitize_path_component(name);
            if std::path::Path::new(&name).extension().is_some() {
                name
            } else {
                format!("{}.{}", name, format.extension())
            }
        }
        None => default_file_name(title, format),
    }
}
