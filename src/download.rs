use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use futures_util::StreamExt;
use log::{debug, error, warn};
use reqwest::{Client, Url, header};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};

use crate::{error::DownloadError, models::Clip, platform::ClipDownloader};

/// Anything smaller is an error page or placeholder served with a 200.
pub const MIN_CLIP_BYTES: u64 = 100_000;

/// Progress is reported once per chunk of this size.
pub const CHUNK_SIZE: usize = 8192;

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Derives the output file name from a clip title, keeping alphanumerics and `_-. `.
///
/// Distinct titles can map to the same name; the later download overwrites the earlier.
pub fn sanitize_filename(title: &str) -> String {
    format!("{title}.mp4")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
        .collect()
}

/// Bytes land here first and only replace `path` once the transfer has passed the size gate.
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Streams clip media to disk with a fixed overall timeout and a minimum size gate.
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self { client })
    }

    async fn stream_to_file<F>(
        &self,
        url: Url,
        path: &Path,
        part: &Path,
        filename: &str,
        on_progress: &mut F,
    ) -> Result<u64, DownloadError>
    where
        F: FnMut(u64, u64, &str),
    {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }

        let total_size = response.content_length().unwrap_or(0);
        if total_size < MIN_CLIP_BYTES {
            return Err(DownloadError::TooSmall {
                bytes: total_size,
                floor: MIN_CLIP_BYTES,
            });
        }

        let mut stream = response.bytes_stream();
        let mut output = File::create(part).await?;
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            for piece in bytes.chunks(CHUNK_SIZE) {
                output.write_all(piece).await?;
                downloaded += piece.len() as u64;
                on_progress(downloaded, total_size, filename);
            }
        }
        output.flush().await?;
        drop(output);

        let written = fs::metadata(part).await?.len();
        if written < MIN_CLIP_BYTES {
            return Err(DownloadError::TooSmall {
                bytes: written,
                floor: MIN_CLIP_BYTES,
            });
        }

        fs::rename(part, path).await?;
        Ok(written)
    }
}

impl ClipDownloader for HttpDownloader {
    async fn download<F>(
        &self,
        clip: &Clip,
        url: Url,
        output_dir: &Path,
        mut on_progress: F,
    ) -> Result<PathBuf, DownloadError>
    where
        F: FnMut(u64, u64, &str),
    {
        fs::create_dir_all(output_dir).await?;

        let filename = sanitize_filename(&clip.title);
        let path = output_dir.join(&filename);
        let part = part_path(&path);

        match self
            .stream_to_file(url, &path, &part, &filename, &mut on_progress)
            .await
        {
            Ok(bytes) => {
                debug!("Downloaded {bytes} bytes to {}", path.display());
                Ok(path)
            }
            Err(err) => {
                warn!("Download of clip {} failed: {err}", clip.id);
                if fs::try_exists(&part).await.unwrap_or(false) {
                    if let Err(remove_err) = fs::remove_file(&part).await {
                        error!("Failed to remove {}: {remove_err}", part.display());
                    }
                }
                Err(err)
            }
        }
    }
}
