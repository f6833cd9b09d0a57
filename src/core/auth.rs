use std::path::{Path, PathBuf};

use vidgrab_core::models::auth::AuthSession;
use vidgrab_core::Platform;

fn auth_session_path(auth_dir: &Path, platform: Platform) -> PathBuf {
    auth_dir.join(format!("{}.json", platform))
}

pub async fn save_auth_session(auth_dir: &Path, session: &AuthSession) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(auth_dir).await?;
    let json = serde_json::to_string_pretty(session)?;
    tokio::fs::write(auth_session_path(auth_dir, session.platform), json).await?;
    Ok(())
}

pub async fn load_auth_session(auth_dir: &Path, platform: Platform) -> anyhow::Result<AuthSession> {
    let json = tokio::fs::read_to_string(auth_session_path(auth_dir, platform)).await?;
    let session: AuthSession = serde_json::from_str(&json)?;
    Ok(session)
}

/// Returns whether a session file existed.
pub async fn delete_auth_session(auth_dir: &Path, platform: Platform) -> anyhow::Result<bool> {
    let path = auth_session_path(auth_dir, platform);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tokio::fs::remove_file(&path).await?;
        return Ok(true);
    }
    Ok(false)
}

/// Every readable session on disk. Unreadable files are logged and skipped.
pub async fn load_all_sessions(auth_dir: &Path) -> Vec<AuthSession> {
    let mut sessions = Vec::new();
    for platform in Platform::ALL {
        let path = auth_session_path(auth_dir, platform);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            continue;
        }
        match load_auth_session(auth_dir, platform).await {
            Ok(session) => sessions.push(session),
            Err(e) => tracing::warn!("[auth] ignoring {}: {}", path.display(), e),
        }
    }
    sessions
}
