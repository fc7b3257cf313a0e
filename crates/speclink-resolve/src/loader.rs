use std::path::Path;

use serde_json::Value;
use speclink_model::Document;
use speclink_source::{decode, location, DefaultFetcher, FetchConfig, Fetcher, Format};
use tracing::info;
use url::Url;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::resolver::{ResolveReport, Resolver};

/// A decoded and fully resolved document.
#[derive(Debug)]
pub struct Loaded {
    pub document: Document,
    /// The untyped tree the document was decoded from.
    pub raw: Value,
    pub report: ResolveReport,
    pub location: Url,
    pub format: Format,
}

/// Reads, decodes and resolves documents.
#[derive(Debug)]
pub struct Loader<F = DefaultFetcher> {
    config: ResolverConfig,
    fetcher: F,
}

impl Loader<DefaultFetcher> {
    /// A loader using the bundled fetchers with default limits.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_fetcher(config, DefaultFetcher::new(FetchConfig::default()))
    }
}

impl<F: Fetcher> Loader<F> {
    pub fn with_fetcher(config: ResolverConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Load a document from the filesystem.
    pub fn load_path(&self, path: &Path) -> Result<Loaded> {
        let location = location::from_path(path).map_err(|source| ResolveError::Read {
            location: path.display().to_string(),
            source,
        })?;
        self.load_url(&location)
    }

    /// Load a document through the fetcher.
    pub fn load_url(&self, location: &Url) -> Result<Loaded> {
        let bytes = self
            .fetcher
            .fetch(location)
            .map_err(|source| ResolveError::Read {
                location: location.to_string(),
                source,
            })?;
        self.load_bytes(&bytes, location)
    }

    /// Decode and resolve `bytes`, treating `location` as where they came from.
    pub fn load_bytes(&self, bytes: &[u8], location: &Url) -> Result<Loaded> {
        let format = Format::detect(Some(location), bytes);
        let raw = decode(bytes, format).map_err(|source| ResolveError::Parse {
            location: location.clone(),
            source,
        })?;
        let document =
            Document::from_value(raw.clone()).map_err(|source| ResolveError::Model {
                location: location.clone(),
                source,
            })?;

        let config = self.config.clone().root(location.clone());
        let report = Resolver::new(config, &self.fetcher).resolve(&document, &raw)?;
        info!(
            location = %location,
            format = format.name(),
            references = report.references,
            "loaded document"
        );

        Ok(Loaded {
            document,
            raw,
            report,
            location: location.clone(),
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use speclink_source::MemoryFetcher;

    use super::*;

    #[test]
    fn load_bytes_decodes_yaml_and_resolves() {
        let yaml = br#"
openapi: 3.0.3
info: {title: Pets, version: "1"}
paths: {}
components:
  schemas:
    Pet:
      type: object
      properties:
        parent: {$ref: '#/components/schemas/Pet'}
"#;
        let location = Url::parse("file:///specs/api.yaml").unwrap();
        let loader = Loader::with_fetcher(ResolverConfig::default(), MemoryFetcher::new());
        let loaded = loader.load_bytes(yaml, &location).unwrap();

        assert_eq!(loaded.format, Format::Yaml);
        assert_eq!(loaded.report.bound, 1);
        assert!(loaded.document.is_resolved());
    }

    #[test]
    fn decode_failure_is_parse_error() {
        let location = Url::parse("file:///specs/api.json").unwrap();
        let loader = Loader::with_fetcher(ResolverConfig::default(), MemoryFetcher::new());
        let err = loader.load_bytes(b"{not json", &location).unwrap_err();
        assert!(matches!(err, ResolveError::Parse { .. }));
        assert!(err.is_decode());
    }

    #[test]
    fn model_mismatch_is_model_error() {
        let location = Url::parse("file:///specs/api.json").unwrap();
        let loader = Loader::with_fetcher(ResolverConfig::default(), MemoryFetcher::new());
        let err = loader
            .load_bytes(br#"{"openapi": 3, "paths": []}"#, &location)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Model { .. }));
    }

    #[test]
    fn missing_root_is_read_error() {
        let location = Url::parse("file:///specs/absent.yaml").unwrap();
        let loader = Loader::with_fetcher(ResolverConfig::default(), MemoryFetcher::new());
        assert!(matches!(
            loader.load_url(&location),
            Err(ResolveError::Read { .. })
        ));
    }
}
