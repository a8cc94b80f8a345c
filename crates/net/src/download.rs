//! File download with progress reporting

use futures::StreamExt;
use kiln_errors::{Error, NetworkError};
use kiln_events::{AppEvent, DownloadEvent, EventEmitter, EventSender};
use kiln_hash::{ContentHash, HashAlgorithm};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::NetClient;

/// Download operation handle
pub struct Download {
    url: Url,
}

/// Result of a download operation
#[derive(Debug)]
pub struct DownloadResult {
    pub url: String,
    pub size: u64,
    pub hash: ContentHash,
}

impl Download {
    /// Create a new download
    ///
    /// # Errors
    ///
    /// Returns an error if the provided URL cannot be parsed.
    pub fn new(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        Ok(Self { url })
    }

    /// Execute the download, streaming to `dest` and hashing the bytes
    ///
    /// The caller decides what to do with the resulting hash; this function
    /// reports the observed digest and never judges it.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server returns an
    /// error status, or the file cannot be created or written.
    pub async fn execute(
        self,
        client: &NetClient,
        dest: &Path,
        algorithm: HashAlgorithm,
        tx: &EventSender,
    ) -> Result<DownloadResult, Error> {
        let url_str = self.url.to_string();

        let response = client.get(url_str.as_str()).await?;

        if !response.status().is_success() {
            return Err(NetworkError::HttpError {
                status: response.status().as_u16(),
                message: response.status().to_string(),
            }
            .into());
        }

        let content_length = response.content_length();

        tx.emit(AppEvent::Download(DownloadEvent::Started {
            url: url_str.clone(),
            total_bytes: content_length,
        }));

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stream to a temporary name so a partial download never looks complete
        let temp_path = dest.with_extension("download");
        let mut file = File::create(&temp_path).await?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(total) = content_length {
                tx.emit(AppEvent::Download(DownloadEvent::Progress {
                    url: url_str.clone(),
                    bytes_downloaded: downloaded,
                    total_bytes: total,
                }));
            }
        }

        file.flush().await?;
        drop(file);

        let hash = ContentHash::hash_file(algorithm, &temp_path).await?;

        tokio::fs::rename(&temp_path, dest).await?;

        tx.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url_str.clone(),
            bytes_downloaded: downloaded,
            hash: hash.to_hex(),
        }));

        Ok(DownloadResult {
            url: url_str,
            size: downloaded,
            hash,
        })
    }
}
