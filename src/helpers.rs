use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const CACHE_DIR_NAME: &str = "leafcheck";
const DEFAULT_MODEL_NAME: &str = "model.onnx";

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Cache location for a downloaded model: `<cache>/leafcheck/<host>/<path>`.
pub fn cache_path(url: &str) -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .ok_or_else(|| Error::Download("no cache directory on this platform".to_string()))?;
    Ok(base.join(CACHE_DIR_NAME).join(cache_key(url)))
}

/// Relative cache path mirroring the URL's host and path. Query and fragment
/// are ignored, and a URL without a file name gets `model.onnx`.
fn cache_key(url: &str) -> PathBuf {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = authority.rsplit('@').next().unwrap_or(authority).to_ascii_lowercase();

    let mut key = PathBuf::from(sanitize(&host));
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != "." && *s != "..") {
        key.push(sanitize(segment));
    }
    if path.is_empty() || path.ends_with('/') {
        key.push(DEFAULT_MODEL_NAME);
    }
    key
}

/// Keeps one URL component as a single safe path component.
fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Returns a local path for `source`, downloading it first when it is a URL.
/// Downloads are reused on later starts.
pub fn resolve_model(source: &str) -> Result<PathBuf> {
    if !is_remote(source) {
        let path = PathBuf::from(source);
        if !path.is_file() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("model file not found: {}", path.display()),
            )));
        }
        return Ok(path);
    }

    let target = cache_path(source)?;
    if target.is_file() {
        tracing::info!(path = %target.display(), "using cached model");
        return Ok(target);
    }
    download(source, &target)?;
    Ok(target)
}

fn download(url: &str, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    tracing::info!(url, path = %target.display(), "downloading model");
    let t = std::time::Instant::now();

    let response = ureq::get(url)
        .call()
        .map_err(|e| Error::Download(e.to_string()))?;

    let bytes = write_atomically(&mut response.into_reader(), target)?;

    tracing::info!(bytes, elapsed = ?t.elapsed(), "model downloaded");
    Ok(())
}

/// Streams `reader` into `target` through a `.part` sibling, so the cache only
/// ever holds complete files. The partial file is removed on failure.
fn write_atomically(reader: &mut impl Read, target: &Path) -> Result<u64> {
    let partial = target.with_extension("part");
    match copy_then_rename(reader, &partial, target) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                tracing::debug!(path = %partial.display(), "could not remove partial download: {}", cleanup);
            }
            Err(e.into())
        }
    }
}

fn copy_then_rename(reader: &mut impl Read, partial: &Path, target: &Path) -> io::Result<u64> {
    let mut file = File::create(partial)?;
    let bytes = io::copy(reader, &mut file)?;
    file.sync_all()?;
    fs::rename(partial, target)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_remote_sources() {
        assert!(is_remote("https://example.com/model.onnx"));
        assert!(is_remote("http://example.com/model.onnx"));
        assert!(!is_remote("models/plant.onnx"));
    }

    #[test]
    fn cache_key_mirrors_host_and_path() {
        assert_eq!(
            cache_key("https://example.com/files/plant.onnx?download=1"),
            PathBuf::from("example.com/files/plant.onnx")
        );
        assert_eq!(cache_key("https://example.com/"), PathBuf::from("example.com/model.onnx"));
        assert_eq!(cache_key("https://example.com"), PathBuf::from("example.com/model.onnx"));
        assert_eq!(
            cache_key("http://user@Example.com:8080/m.onnx#frag"),
            PathBuf::from("example.com_8080/m.onnx")
        );
    }

    #[test]
    fn same_file_name_on_different_urls_does_not_collide() {
        let a = cache_key("https://example.com/v1/model.onnx");
        let b = cache_key("https://other.org/v2/model.onnx");
        let c = cache_key("https://example.com/v2/model.onnx");
        assert_ne!(a, b);
        assert_ne!(a, c);
        if let (Ok(a), Ok(b)) = (
            cache_path("https://example.com/v1/model.onnx"),
            cache_path("https://other.org/v2/model.onnx"),
        ) {
            assert_ne!(a, b);
            assert!(a.ends_with("leafcheck/example.com/v1/model.onnx"));
        }
    }

    #[test]
    fn cache_key_stays_inside_the_cache() {
        let key = cache_key("https://example.com/../../etc/./passwd");
        assert_eq!(key, PathBuf::from("example.com/etc/passwd"));
        assert_eq!(cache_key("https://../x.onnx"), PathBuf::from("_/x.onnx"));
        assert!(key.components().all(|c| matches!(c, std::path::Component::Normal(_))));
    }

    /// Yields a few bytes, then fails like a dropped connection.
    struct DroppedConnection {
        sent: bool,
    }

    impl Read for DroppedConnection {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
            }
            self.sent = true;
            let chunk = b"onnx";
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            Ok(n)
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("leafcheck-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn failed_download_leaves_no_partial_file() {
        let dir = scratch_dir("failed-download");
        let target = dir.join("model.onnx");

        let err = write_atomically(&mut DroppedConnection { sent: false }, &target).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!target.exists());
        assert!(!target.with_extension("part").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn completed_download_replaces_partial_file() {
        let dir = scratch_dir("completed-download");
        let target = dir.join("model.onnx");

        let bytes = write_atomically(&mut &b"weights"[..], &target).unwrap();
        assert_eq!(bytes, 7);
        assert_eq!(fs::read(&target).unwrap(), b"weights");
        assert!(!target.with_extension("part").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_local_model_is_an_error() {
        let err = resolve_model("/nonexistent/leafcheck/model.onnx").unwrap_err();
        assert!(err.to_string().contains("model file not found"));
    }
}
