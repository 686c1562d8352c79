//! HTTP download functionality for deto artifacts.
//!
//! Artifacts are streamed straight from the response body into the destination
//! file. After every chunk written, the registered [`ProgressCallback`] receives
//! the byte count together with the total announced by the server, which lets
//! a renderer running elsewhere compute the completed fraction.
//!
//! The server must declare a `Content-Length`; without it progress cannot be
//! expressed as a fraction and the download is refused.
//!
//! Downloads are not retried and carry no timeout beyond the transport
//! defaults. Verification is delegated to [`super::verify`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use super::verify;
use crate::errors::DetoError;

/// User-Agent header for artifact requests.
const USER_AGENT: &str = concat!("deto/", env!("CARGO_PKG_VERSION"));

/// Progress event emitted during downloads.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Download has started.
    Started {
        /// The URL being downloaded.
        url: String,
        /// Total file size in bytes, from `Content-Length`.
        total: u64,
    },
    /// A chunk has been written to disk.
    Progress {
        /// Bytes written so far.
        downloaded: u64,
        /// Total file size in bytes.
        total: u64,
    },
    /// Download completed successfully.
    Completed,
    /// Download failed with an error.
    Failed {
        /// Error description.
        error: String,
    },
}

impl ProgressEvent {
    /// Returns the completed fraction in `[0, 1]`, if this event carries one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::Started { .. } => Some(0.0),
            Self::Progress { downloaded, total } if *total > 0 => {
                Some((*downloaded as f64 / *total as f64).clamp(0.0, 1.0))
            }
            Self::Progress { .. } | Self::Failed { .. } => None,
            Self::Completed => Some(1.0),
        }
    }
}

/// Callback type for receiving progress updates during downloads.
///
/// The callback is invoked on the transfer task; it is wrapped in `Arc` so the
/// same renderer can be shared across async boundaries.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Streams remote artifacts to local files.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    callback: ProgressCallback,
}

impl Downloader {
    /// Creates a downloader reporting to `callback`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(callback: ProgressCallback) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, callback })
    }

    /// Downloads `url` into `dest` and returns the local path.
    ///
    /// On failure the partially written file is removed and a
    /// [`ProgressEvent::Failed`] is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The connection fails or the status is not a success (`TransportError`)
    /// - The response has no `Content-Length` (`MissingContentLength`)
    /// - The destination file cannot be created or written
    pub async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        match self.transfer(url, dest).await {
            Ok(()) => {
                (self.callback)(ProgressEvent::Completed);
                Ok(dest.to_path_buf())
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(dest).await
                    && cleanup.kind() != std::io::ErrorKind::NotFound
                {
                    log::warn!(
                        "could not remove partial download {}: {cleanup}",
                        dest.display()
                    );
                }
                (self.callback)(ProgressEvent::Failed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Downloads `url` into `dest` and checks it against `checksum`.
    ///
    /// Returns `Ok(false)` when the digest does not match. The file is left on
    /// disk in both cases; removing it is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or the algorithm is unsupported.
    pub async fn download_and_verify(
        &self,
        url: &str,
        checksum: &str,
        algorithm: &str,
        dest: &Path,
    ) -> Result<bool> {
        let path = self.download(url, dest).await?;
        verify::verify(&path, checksum, algorithm)
    }

    async fn transfer(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DetoError::transport(format!("failed to connect to {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DetoError::transport(format!("HTTP error {status}: {url}")).into());
        }

        let total = response
            .content_length()
            .ok_or_else(|| DetoError::missing_content_length(url))?;

        log::debug!("downloading {url} ({total} bytes) to {}", dest.display());
        (self.callback)(ProgressEvent::Started {
            url: url.to_string(),
            total,
        });

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| DetoError::transport(format!("failed to read from {url}: {e}")))?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write to {}", dest.display()))?;

            downloaded += chunk.len() as u64;
            (self.callback)(ProgressEvent::Progress { downloaded, total });
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to flush {}", dest.display()))?;

        Ok(())
    }
}
