use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, Result};

/// Default maximum document size: 16 MiB.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Retrieves the raw bytes behind an absolute location.
///
/// Relative references are joined against their base before a fetcher sees
/// them, so implementations only deal with absolute URLs.
pub trait Fetcher {
    fn fetch(&self, location: &Url) -> Result<Bytes>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, location: &Url) -> Result<Bytes> {
        (**self).fetch(location)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, location: &Url) -> Result<Bytes> {
        (**self).fetch(location)
    }
}

/// Limits applied by the bundled fetchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Maximum bytes accepted for a single document.
    pub max_document_size: usize,
    /// Whole-request timeout for HTTP fetches.
    pub http_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            http_timeout: Duration::from_secs(30),
        }
    }
}

/// Reads `file:` locations from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    config: FetchConfig,
}

impl FileFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Read a filesystem path directly, bounded by the configured size limit.
    pub fn read_path(&self, path: &Path) -> Result<Bytes> {
        let io_err = |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = std::fs::File::open(path).map_err(io_err)?;
        let metadata = file.metadata().map_err(io_err)?;
        if !metadata.is_file() {
            return Err(FetchError::NotAFile(path.to_path_buf()));
        }

        let max_bytes = self.config.max_document_size;
        if metadata.len() > max_bytes as u64 {
            return Err(FetchError::TooLarge {
                location: path.display().to_string(),
                size: metadata.len(),
                max: max_bytes,
            });
        }

        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = Vec::with_capacity(metadata.len() as usize);
        file.take(read_limit)
            .read_to_end(&mut content)
            .map_err(io_err)?;
        if content.len() > max_bytes {
            return Err(FetchError::TooLarge {
                location: path.display().to_string(),
                size: content.len() as u64,
                max: max_bytes,
            });
        }

        debug!(path = %path.display(), bytes = content.len(), "read document");
        Ok(Bytes::from(content))
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, location: &Url) -> Result<Bytes> {
        if location.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme {
                scheme: location.scheme().to_string(),
                location: location.to_string(),
            });
        }
        let path = location
            .to_file_path()
            .map_err(|()| FetchError::InvalidFileLocation(location.to_string()))?;
        self.read_path(&path)
    }
}

/// Dispatches on the URI scheme: `file:` always, `http(s):` with the `http` feature.
#[derive(Debug, Clone, Default)]
pub struct DefaultFetcher {
    file: FileFetcher,
    #[cfg(feature = "http")]
    http: crate::http::HttpFetcher,
}

impl DefaultFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            file: FileFetcher::new(config),
            #[cfg(feature = "http")]
            http: crate::http::HttpFetcher::new(config),
        }
    }
}

impl Fetcher for DefaultFetcher {
    fn fetch(&self, location: &Url) -> Result<Bytes> {
        match location.scheme() {
            "file" => self.file.fetch(location),
            #[cfg(feature = "http")]
            "http" | "https" => self.http.fetch(location),
            scheme => Err(FetchError::UnsupportedScheme {
                scheme: scheme.to_string(),
                location: location.to_string(),
            }),
        }
    }
}

/// Serves documents from memory and counts every fetch.
///
/// Locations are matched without their fragment.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    documents: HashMap<String, Bytes>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under an absolute location.
    pub fn insert(&mut self, location: &Url, body: impl Into<Bytes>) {
        self.documents.insert(strip_fragment(location), body.into());
    }

    /// Builder-style [`MemoryFetcher::insert`].
    pub fn with(mut self, location: &Url, body: impl Into<Bytes>) -> Self {
        self.insert(location, body);
        self
    }

    /// Number of fetches served or refused so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, location: &Url) -> Result<Bytes> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let key = strip_fragment(location);
        self.documents
            .get(&key)
            .cloned()
            .ok_or(FetchError::NotFound(key))
    }
}

fn strip_fragment(location: &Url) -> String {
    let mut location = location.clone();
    location.set_fragment(None);
    location.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::from_path;

    #[test]
    fn file_fetcher_reads_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.yaml");
        std::fs::write(&path, "openapi: 3.0.3\n").unwrap();

        let location = from_path(&path).unwrap();
        let bytes = FileFetcher::default().fetch(&location).unwrap();
        assert_eq!(bytes.as_ref(), b"openapi: 3.0.3\n");
    }

    #[test]
    fn file_fetcher_enforces_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        std::fs::write(&path, "[1,2,3,4,5,6,7,8,9]").unwrap();

        let fetcher = FileFetcher::new(FetchConfig {
            max_document_size: 8,
            ..FetchConfig::default()
        });
        assert!(matches!(
            fetcher.read_path(&path),
            Err(FetchError::TooLarge { max: 8, .. })
        ));
    }

    #[test]
    fn file_fetcher_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let location = from_path(&dir.path().join("missing.yaml")).unwrap();
        assert!(matches!(
            FileFetcher::default().fetch(&location),
            Err(FetchError::Io { .. })
        ));
    }

    #[test]
    fn file_fetcher_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FileFetcher::default().read_path(dir.path()),
            Err(FetchError::NotAFile(_))
        ));
    }

    #[test]
    fn default_fetcher_rejects_unknown_schemes() {
        let location = Url::parse("ftp://example.com/api.yaml").unwrap();
        assert!(matches!(
            DefaultFetcher::default().fetch(&location),
            Err(FetchError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn memory_fetcher_ignores_fragment_and_counts() {
        let base = Url::parse("https://example.com/common.yaml").unwrap();
        let fetcher = MemoryFetcher::new().with(&base, "a: 1");

        let with_fragment = Url::parse("https://example.com/common.yaml#/a").unwrap();
        assert_eq!(fetcher.fetch(&with_fragment).unwrap().as_ref(), b"a: 1");
        assert!(matches!(
            fetcher.fetch(&Url::parse("https://example.com/other.yaml").unwrap()),
            Err(FetchError::NotFound(_))
        ));
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[test]
    fn status_is_surfaced() {
        let err = FetchError::Status {
            location: "https://example.com/a.yaml".to_string(),
            status: 404,
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("404"));
    }
}
