//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use kiln_events::{channel, AppEvent, DownloadEvent};
    use kiln_hash::{ContentHash, HashAlgorithm};
    use kiln_net::{download_file, NetClient};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_download_file() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        let content = b"test archive content";
        let mock = server.mock(|when, then| {
            when.method(GET).path("/libmad-0.16.4.tar.gz");
            then.status(200)
                .header("content-length", content.len().to_string())
                .body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("libmad-0.16.4.tar.gz");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/libmad-0.16.4.tar.gz");

        let result = download_file(&client, &url, &dest, HashAlgorithm::Sha256, &tx)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(result.size, content.len() as u64);
        assert_eq!(
            result.hash,
            ContentHash::from_data(HashAlgorithm::Sha256, content)
        );

        let downloaded = tokio::fs::read(&dest).await.unwrap();
        assert_eq!(downloaded, content);

        // Check events
        let mut saw_start = false;
        let mut saw_complete = false;

        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Download(DownloadEvent::Started { .. }) => saw_start = true,
                AppEvent::Download(DownloadEvent::Completed { .. }) => saw_complete = true,
                _ => {}
            }
        }

        assert!(saw_start);
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn test_download_http_error_is_not_success() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/missing.tar.gz");
            then.status(404);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("missing.tar.gz");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/missing.tar.gz");

        let result = download_file(&client, &url, &dest, HashAlgorithm::Sha256, &tx).await;
        assert!(result.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_then_surface() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let mock = server.mock(|when, then| {
            when.method(GET).path("/unstable.tar.gz");
            then.status(503);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("unstable.tar.gz");
        let config = kiln_net::NetConfig {
            retry_delay: std::time::Duration::from_millis(10),
            ..Default::default()
        };
        let client = NetClient::new(config).unwrap();
        let url = server.url("/unstable.tar.gz");

        let result = download_file(&client, &url, &dest, HashAlgorithm::Sha256, &tx).await;
        assert!(result.is_err());
        // Initial attempt plus the full retry budget
        assert_eq!(mock.hits(), 4);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_partial_download_leaves_no_final_file() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        let content = b"retryable";
        server.mock(|when, then| {
            when.method(GET).path("/flaky.tar.gz");
            then.status(200).body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("flaky.tar.gz");
        let client = NetClient::with_defaults().unwrap();
        let url = server.url("/flaky.tar.gz");

        download_file(&client, &url, &dest, HashAlgorithm::Blake3, &tx)
            .await
            .unwrap();

        // The .download temp name must have been renamed away
        assert!(dest.exists());
        assert!(!dest.with_extension("download").exists());
    }
}
