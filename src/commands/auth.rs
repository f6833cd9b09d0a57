use std::path::PathBuf;

use vidgrab_core::models::auth::AuthSession;
use vidgrab_core::Platform;

use crate::core::auth::{delete_auth_session, save_auth_session};
use crate::AppContext;

fn parse_cookie(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => anyhow::bail!("cookie must look like name=value, got '{}'", raw),
    }
}

pub fn build_session(
    platform: Platform,
    cookies_file: Option<PathBuf>,
    cookies: &[String],
    token: Option<String>,
) -> anyhow::Result<AuthSession> {
    let mut session = AuthSession::new(platform);
    session.cookies_file = cookies_file;
    session.cookies = cookies
        .iter()
        .map(|c| parse_cookie(c))
        .collect::<anyhow::Result<_>>()?;
    session.token = token.filter(|t| !t.trim().is_empty());

    if session.is_empty() {
        anyhow::bail!("nothing to store: pass --cookies-file, --cookie or --token");
    }
    Ok(session)
}

pub async fn login(
    ctx: &AppContext,
    platform: Platform,
    cookies_file: Option<PathBuf>,
    cookies: &[String],
    token: Option<String>,
) -> anyhow::Result<()> {
    if let Some(path) = &cookies_file {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            anyhow::bail!("cookies file {} does not exist", path.display());
        }
    }
    let session = build_session(platform, cookies_file, cookies, token)?;

    ctx.dispatcher.set_authentication(platform, session.clone())?;
    save_auth_session(&ctx.paths.auth_dir(), &session).await?;
    println!("Saved {} session", platform.display_name());
    Ok(())
}

pub async fn logout(ctx: &AppContext, platform: Platform) -> anyhow::Result<()> {
    if delete_auth_session(&ctx.paths.auth_dir(), platform).await? {
        println!("Removed {} session", platform.display_name());
    } else {
        println!("No stored {} session", platform.display_name());
    }
    Ok(())
}
