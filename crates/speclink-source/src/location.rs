use std::path::Path;

use url::Url;

use crate::error::{FetchError, Result};

/// Absolute `file:` URL for a filesystem path, relative paths taken from the working directory.
pub fn from_path(path: &Path) -> Result<Url> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| FetchError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };
    Url::from_file_path(&absolute)
        .map_err(|()| FetchError::InvalidFileLocation(absolute.display().to_string()))
}

/// The working directory as a base location (trailing slash included).
pub fn cwd_base() -> Result<Url> {
    let cwd = std::env::current_dir().map_err(|source| FetchError::Io {
        path: ".".into(),
        source,
    })?;
    Url::from_directory_path(&cwd)
        .map_err(|()| FetchError::InvalidFileLocation(cwd.display().to_string()))
}

/// Parse a command-line style location: a URL when it has a known scheme, a path otherwise.
pub fn parse(input: &str) -> Result<Url> {
    match Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "file" | "http" | "https") => Ok(url),
        _ => from_path(Path::new(input)),
    }
}
