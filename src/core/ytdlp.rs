use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::anyhow;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use vidgrab_core::models::auth::AuthSession;
use vidgrab_core::models::settings::AppSettings;

use crate::core::http_client::HttpClient;

const STDERR_TAIL: usize = 400;

fn bin_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

fn release_url() -> &'static str {
    if cfg!(target_os = "windows") {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp.exe"
    } else if cfg!(target_os = "macos") {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp_macos"
    } else {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp"
    }
}

/// Handle on the yt-dlp executable. The binary is resolved on first use:
/// configured path, then `PATH`, then a managed copy (downloaded if missing).
pub struct YtDlp {
    configured: Option<PathBuf>,
    bin_dir: PathBuf,
    proxy_url: Option<String>,
    http: HttpClient,
    binary: OnceCell<PathBuf>,
}

/// A running `-o -` download. Read `stdout` to EOF, then call [`MediaStream::finish`].
pub struct MediaStream {
    child: Child,
    pub stdout: ChildStdout,
    stderr: JoinHandle<String>,
}

impl MediaStream {
    pub async fn finish(mut self) -> anyhow::Result<()> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| anyhow!("yt-dlp process failed: {}", e))?;
        let stderr = self.stderr.await.unwrap_or_default();
        if status.success() {
            return Ok(());
        }
        Err(anyhow!("yt-dlp exited with {}: {}", status, tail(&stderr)))
    }
}

fn tail(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    match trimmed.char_indices().rev().nth(STDERR_TAIL) {
        Some((idx, _)) => &trimmed[idx..],
        None => trimmed,
    }
}

/// Extra yt-dlp arguments carrying an authentication session.
pub fn auth_args(session: &AuthSession) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(file) = &session.cookies_file {
        args.push("--cookies".to_string());
        args.push(file.to_string_lossy().to_string());
    }
    if let Some(cookie) = session.cookie_header() {
        args.push("--add-header".to_string());
        args.push(format!("Cookie:{}", cookie));
    }
    if let Some(token) = &session.token {
        args.push("--add-header".to_string());
        args.push(format!("Authorization:Bearer {}", token));
    }
    args
}

/// One JSON object per line, as printed by `--dump-json`; junk lines are skipped.
pub fn parse_json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

fn stream_args(url: &str, selector: &str) -> Vec<String> {
    [
        "-f", selector, "--no-playlist", "--no-part", "--quiet", "--no-warnings", "-o", "-", url,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl YtDlp {
    pub fn new(settings: &AppSettings, bin_dir: PathBuf, http: HttpClient) -> Self {
        Self {
            configured: settings.network.ytdlp_path.clone(),
            bin_dir,
            proxy_url: settings.proxy.url(),
            http,
            binary: OnceCell::new(),
        }
    }

    fn managed_path(&self) -> PathBuf {
        self.bin_dir.join(bin_name())
    }

    pub async fn binary(&self) -> anyhow::Result<&Path> {
        let path = self.binary.get_or_try_init(|| self.locate()).await?;
        Ok(path.as_path())
    }

    async fn locate(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.configured {
            if path.exists() {
                return Ok(path.clone());
            }
            tracing::warn!("[yt-dlp] configured path {} does not exist", path.display());
        }

        let on_path = tokio::process::Command::new(bin_name())
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if matches!(on_path, Ok(status) if status.success()) {
            return Ok(PathBuf::from(bin_name()));
        }

        let managed = self.managed_path();
        if managed.exists() {
            return Ok(managed);
        }

        self.install_managed().await
    }

    async fn install_managed(&self) -> anyhow::Result<PathBuf> {
        let target = self.managed_path();
        tracing::info!("[yt-dlp] not found, downloading to {}", target.display());
        tokio::fs::create_dir_all(&self.bin_dir).await?;

        let bytes = self
            .http
            .download_binary(release_url(), &[])
            .await
            .map_err(|e| anyhow!("failed to download yt-dlp: {}", e))?;
        tokio::fs::write(&target, &bytes).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o755);
            tokio::fs::set_permissions(&target, perms).await?;
        }

        Ok(target)
    }

    async fn command(&self) -> anyhow::Result<tokio::process::Command> {
        let mut cmd = tokio::process::Command::new(self.binary().await?);
        cmd.env("PYTHONIOENCODING", "utf-8");
        cmd.env("PYTHONUTF8", "1");
        if let Some(proxy) = &self.proxy_url {
            cmd.arg("--proxy").arg(proxy);
        }
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        Ok(cmd)
    }

    async fn run_json(&self, args: &[&str], extra: &[String]) -> anyhow::Result<String> {
        let mut cmd = self.command().await?;
        cmd.args(extra).args(args);
        tracing::debug!("[yt-dlp] {:?}", args);

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| anyhow!("failed to run yt-dlp: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("yt-dlp failed: {}", tail(&stderr)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Metadata for a single item (`--dump-json`).
    pub async fn fetch_metadata(
        &self,
        url: &str,
        extra: &[String],
    ) -> anyhow::Result<serde_json::Value> {
        let stdout = self
            .run_json(&["--dump-json", "--no-warnings", "--no-playlist", url], extra)
            .await?;
        serde_json::from_str(stdout.trim())
            .map_err(|e| anyhow!("yt-dlp returned invalid JSON: {}", e))
    }

    /// Flat listing of a playlist or channel, one value per entry.
    pub async fn fetch_collection(
        &self,
        url: &str,
        extra: &[String],
    ) -> anyhow::Result<Vec<serde_json::Value>> {
        let stdout = self
            .run_json(&["--flat-playlist", "--dump-json", "--no-warnings", url], extra)
            .await?;
        Ok(parse_json_lines(&stdout))
    }

    pub async fn open_media_stream(
        &self,
        url: &str,
        selector: &str,
        extra: &[String],
    ) -> anyhow::Result<MediaStream> {
        let mut cmd = self.command().await?;
        cmd.args(extra).args(stream_args(url, selector));
        tracing::debug!("[yt-dlp] streaming {} with selector {}", url, selector);

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("failed to start yt-dlp: {}", e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("yt-dlp stdout not captured"))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("yt-dlp stderr not captured"))?;
        let stderr = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr_pipe.read_to_string(&mut buf).await;
            buf
        });

        Ok(MediaStream {
            child,
            stdout,
            stderr,
        })
    }
}
