use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use vidgrab_core::DownloadError;

const READ_BUF_SIZE: usize = 64 * 1024;
const WRITE_BUF_SIZE: usize = 256 * 1024;
/// Bytes at which the estimate for unknown sizes reaches 50%.
const UNKNOWN_SIZE_HALF_POINT: f64 = 500_000.0;
const UNKNOWN_SIZE_CAP: f64 = 95.0;

pub fn part_path_for(output: &Path) -> PathBuf {
    let mut part = output.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

fn estimate_percent(written: u64, expected_total: Option<u64>) -> f64 {
    match expected_total {
        Some(total) if total > 0 => (written as f64 / total as f64 * 100.0).min(99.9),
        _ => {
            let percent = written as f64 / (written as f64 + UNKNOWN_SIZE_HALF_POINT) * 100.0;
            percent.min(UNKNOWN_SIZE_CAP)
        }
    }
}

/// Copies `reader` into `part_path` until EOF. The part file is removed on
/// every failure, so a caller only ever sees a complete file or none.
pub async fn write_stream<R>(
    reader: &mut R,
    part_path: &Path,
    expected_total: Option<u64>,
    progress: Option<&mpsc::Sender<f64>>,
    stall_timeout: Duration,
) -> Result<u64, DownloadError>
where
    R: AsyncRead + Unpin,
{
    match copy_to_part(reader, part_path, expected_total, progress, stall_timeout).await {
        Ok(written) => Ok(written),
        Err(e) => {
            let _ = tokio::fs::remove_file(part_path).await;
            Err(e)
        }
    }
}

async fn copy_to_part<R>(
    reader: &mut R,
    part_path: &Path,
    expected_total: Option<u64>,
    progress: Option<&mpsc::Sender<f64>>,
    stall_timeout: Duration,
) -> Result<u64, DownloadError>
where
    R: AsyncRead + Unpin,
{
    let file = tokio::fs::File::create(part_path).await?;
    let mut file = tokio::io::BufWriter::with_capacity(WRITE_BUF_SIZE, file);
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut written: u64 = 0;

    loop {
        let n = match tokio::time::timeout(stall_timeout, reader.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(DownloadError::Stream(format!("read failed: {}", e))),
            Err(_) => {
                return Err(DownloadError::Stream(format!(
                    "no data received for {} seconds",
                    stall_timeout.as_secs()
                )))
            }
        };

        file.write_all(&buf[..n])
            .await
            .map_err(|e| DownloadError::Stream(format!("write failed (disk full?): {}", e)))?;
        written += n as u64;

        if let Some(tx) = progress {
            let _ = tx.send(estimate_percent(written, expected_total)).await;
        }
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields `payload` once, then fails.
    struct FailingReader {
        payload: Option<Vec<u8>>,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.payload.take() {
                Some(bytes) => {
                    buf.put_slice(&bytes);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "pipe closed",
                ))),
            }
        }
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(part_path_for(Path::new("video.mp4")), PathBuf::from("video.mp4.part"));
        assert_eq!(part_path_for(Path::new("video")), PathBuf::from("video.part"));
        assert_eq!(
            part_path_for(Path::new("downloads/list/clip.mp4")),
            PathBuf::from("downloads/list/clip.mp4.part")
        );
    }

    #[test]
    fn unknown_size_estimate_is_capped() {
        assert_eq!(estimate_percent(0, None), 0.0);
        assert!((estimate_percent(500_000, None) - 50.0).abs() < f64::EPSILON);
        assert_eq!(estimate_percent(u64::MAX / 2, None), 95.0);
        assert_eq!(estimate_percent(50, Some(200)), 25.0);
    }

    #[tokio::test]
    async fn copies_until_eof() {
        let dir = tempfile::tempdir().unwrap();
        let part = dir.path().join("a.mp4.part");
        let data = vec![7u8; 200_000];
        let mut reader: &[u8] = &data;
        let (tx, mut rx) = mpsc::channel(64);

        let written = write_stream(&mut reader, &part, None, Some(&tx), Duration::from_secs(5))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(written, 200_000);
        assert_eq!(tokio::fs::read(&part).await.unwrap().len(), 200_000);
        let mut last = 0.0;
        while let Some(p) = rx.recv().await {
            assert!(p >= last && p <= 95.0);
            last = p;
        }
        assert!(last > 0.0);
    }

    #[tokio::test]
    async fn failed_stream_removes_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let part = dir.path().join("b.mp4.part");
        let mut reader = FailingReader {
            payload: Some(b"partial".to_vec()),
        };

        let err = write_stream(&mut reader, &part, None, None, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Stream(_)));
        assert!(!part.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_stream_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let part = dir.path().join("c.mp4.part");
        let (_keep_open, mut reader) = tokio::io::duplex(64);

        let err = write_stream(&mut reader, &part, None, None, Duration::from_secs(45))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no data received for 45 seconds"));
        assert!(!part.exists());
    }
}
