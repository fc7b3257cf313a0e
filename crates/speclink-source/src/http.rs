use std::io::Read;

use bytes::Bytes;
use tracing::{debug, info};
use url::Url;

use crate::error::{FetchError, Result};
use crate::fetch::{FetchConfig, Fetcher};

/// Blocking HTTP(S) fetcher.
///
/// A non-2xx response is [`FetchError::Status`]; anything that prevents a
/// response from arriving is [`FetchError::Transport`]. No retries are made.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(self.config.http_timeout)
            .build()
            .map_err(|err| FetchError::Transport {
                location: String::new(),
                message: err.to_string(),
            })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &Url) -> Result<Bytes> {
        let transport = |err: reqwest::Error| FetchError::Transport {
            location: location.to_string(),
            message: err.to_string(),
        };

        info!(%location, "fetching remote document");
        let response = self
            .client()?
            .get(location.as_str())
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        let max_bytes = self.config.max_document_size;
        if let Some(len) = response.content_length() {
            if len > max_bytes as u64 {
                return Err(FetchError::TooLarge {
                    location: location.to_string(),
                    size: len,
                    max: max_bytes,
                });
            }
        }

        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = Vec::new();
        response
            .take(read_limit)
            .read_to_end(&mut content)
            .map_err(|err| FetchError::Transport {
                location: location.to_string(),
                message: err.to_string(),
            })?;
        if content.len() > max_bytes {
            return Err(FetchError::TooLarge {
                location: location.to_string(),
                size: content.len() as u64,
                max: max_bytes,
            });
        }

        debug!(%location, bytes = content.len(), "fetched remote document");
        Ok(Bytes::from(content))
    }
}
