//! Fetch & verify stage
//!
//! Downloads the source archive, checks its content hash against the recipe,
//! and extracts it. No build step may run against unverified source: a hash
//! mismatch aborts the pipeline here.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use kiln_errors::{BuildError, Error};
use kiln_events::{AppEvent, BuildEvent, EventEmitter};
use kiln_net::{download_file, NetClient};

use crate::environment::BuildEnvironment;
use crate::recipe::Recipe;

/// Fetch the recipe's source, verify its hash, and produce a source tree
///
/// Returns the directory build steps run in: the extracted tree for archive
/// sources, or the sources directory itself for plain files.
///
/// # Errors
///
/// Returns a network error if the download fails after bounded retries, or
/// a hash-mismatch error if the fetched bytes do not match the declared
/// checksum. The mismatched file is removed from scratch so nothing can
/// build against it.
pub async fn fetch_and_verify(
    recipe: &Recipe,
    env: &BuildEnvironment,
    net: &NetClient,
) -> Result<PathBuf, Error> {
    let url = &recipe.source.fetch.url;
    let expected = recipe.source.fetch.checksum.parse()?;

    let filename = archive_filename(url);
    let archive_path = env.sources_dir().join(&filename);

    let sender = env
        .event_sender()
        .cloned()
        .unwrap_or_else(|| kiln_events::channel().0);
    let result = download_file(net, url, &archive_path, expected.algorithm(), &sender).await?;

    if result.hash != expected {
        let _ = tokio::fs::remove_file(&archive_path).await;
        return Err(BuildError::HashMismatch {
            file: filename,
            expected: expected.to_hex(),
            actual: result.hash.to_hex(),
        }
        .into());
    }

    let src_dir = if is_archive(&archive_path) {
        let dest = env.sources_dir().join("src");
        extract_tar_gz(&archive_path, &dest).await?;
        dest
    } else {
        env.sources_dir().to_path_buf()
    };

    env.emit(AppEvent::Build(BuildEvent::SourceReady {
        path: src_dir.display().to_string(),
    }));

    Ok(src_dir)
}

/// Last path segment of the source URL, or a fixed fallback
fn archive_filename(url: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("source.tar.gz")
        .to_string()
}

/// Check if a file is an archive that should be extracted
fn is_archive(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if matches!(ext, "gz" | "tgz") {
            return true;
        }
    }
    // For files without a telling extension, check the gzip magic number
    let mut magic = [0u8; 2];
    match std::fs::File::open(path).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) => magic == [0x1f, 0x8b],
        Err(_) => false,
    }
}

/// Extract a gzip-compressed tar archive, stripping the first path component
///
/// Source archives conventionally wrap everything in a `name-version/`
/// directory; entries are confined to `dest`.
async fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), Error> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<(), Error> {
        use std::fs::File;
        use tar::Archive;

        std::fs::create_dir_all(&dest).map_err(|e| BuildError::ExtractionFailed {
            message: format!("cannot create {}: {e}", dest.display()),
        })?;

        let file = File::open(&archive).map_err(|e| BuildError::ExtractionFailed {
            message: format!("cannot open archive: {e}"),
        })?;
        let mut tar = Archive::new(GzDecoder::new(file));

        for entry in tar.entries().map_err(|e| BuildError::ExtractionFailed {
            message: e.to_string(),
        })? {
            let mut entry = entry.map_err(|e| BuildError::ExtractionFailed {
                message: e.to_string(),
            })?;
            let path = entry.path().map_err(|e| BuildError::ExtractionFailed {
                message: e.to_string(),
            })?;

            // Strip the leading name-version/ component
            let components: Vec<_> = path.components().collect();
            if components.len() <= 1 {
                continue;
            }
            let stripped: PathBuf = components[1..].iter().collect();

            // Refuse entries that would escape the destination
            if stripped
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
            {
                return Err(BuildError::ExtractionFailed {
                    message: format!("archive entry escapes destination: {}", path.display()),
                }
                .into());
            }

            let target = dest.join(&stripped);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| BuildError::ExtractionFailed {
                    message: format!("cannot create {}: {e}", parent.display()),
                })?;
            }
            entry
                .unpack(&target)
                .map_err(|e| BuildError::ExtractionFailed {
                    message: format!("cannot unpack {}: {e}", target.display()),
                })?;
        }

        Ok(())
    })
    .await
    .map_err(|e| {
        Error::from(BuildError::ExtractionFailed {
            message: format!("task join error: {e}"),
        })
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_filename() {
        assert_eq!(
            archive_filename("https://example.org/pub/libmad-0.16.4.tar.gz"),
            "libmad-0.16.4.tar.gz"
        );
        assert_eq!(archive_filename("https://example.org/"), "source.tar.gz");
    }

    #[test]
    fn test_is_archive_sniffs_magic_without_extension() {
        let temp = tempfile::tempdir().unwrap();

        let gz = temp.path().join("source");
        std::fs::write(&gz, [0x1f, 0x8b, 0x08, 0x00]).unwrap();
        assert!(is_archive(&gz));

        let plain = temp.path().join("patch");
        std::fs::write(&plain, b"plain text").unwrap();
        assert!(!is_archive(&plain));

        let short = temp.path().join("tiny");
        std::fs::write(&short, [0x1f]).unwrap();
        assert!(!is_archive(&short));
    }

    #[tokio::test]
    async fn test_extract_strips_top_level_dir() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("libmad-0.16.4.tar.gz");

        // Build a small archive with the conventional top-level directory
        let mut builder = tar::Builder::new(GzEncoder::new(
            std::fs::File::create(&archive_path).unwrap(),
            Compression::default(),
        ));
        let data = b"int main(void) { return 0; }\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "libmad-0.16.4/minimad.c", &data[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = temp.path().join("src");
        extract_tar_gz(&archive_path, &dest).await.unwrap();

        let extracted = std::fs::read(dest.join("minimad.c")).unwrap();
        assert_eq!(extracted, data);
    }

    #[tokio::test]
    async fn test_extract_rejects_escaping_entry() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let temp = tempfile::tempdir().unwrap();
        let archive_path = temp.path().join("evil.tar.gz");

        let mut builder = tar::Builder::new(GzEncoder::new(
            std::fs::File::create(&archive_path).unwrap(),
            Compression::default(),
        ));
        let data = b"pwned";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        // `append_data` refuses `..` in paths, so write the name bytes
        // directly to build the malicious fixture
        let name = b"top/../../escape.txt";
        header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name);
        header.set_cksum();
        builder.append(&header, &data[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = temp.path().join("src");
        assert!(extract_tar_gz(&archive_path, &dest).await.is_err());
    }
}
