//! JSON document loading.
//!
//! Schemas and instance documents are both plain JSON and go through the
//! same loaders. A source string names either a local file or, with the
//! `remote` feature, an `http(s)://` URL.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;

#[cfg(feature = "remote")]
use std::time::Duration;

#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// Classify a CLI-style source string.
    pub fn parse(source: &str) -> Self {
        if is_url(source) {
            DocumentSource::Url(source.to_string())
        } else {
            DocumentSource::File(PathBuf::from(source))
        }
    }

    /// Fetch and parse the document.
    ///
    /// # Errors
    ///
    /// See [`load_document`] and [`load_document_url`]. Without the `remote`
    /// feature a URL source fails with `LoadError::FileNotFound`.
    pub fn load(&self) -> Result<Value, LoadError> {
        match self {
            DocumentSource::File(path) => load_document(path),
            #[cfg(feature = "remote")]
            DocumentSource::Url(url) => load_document_url(url),
            #[cfg(not(feature = "remote"))]
            DocumentSource::Url(url) => Err(LoadError::FileNotFound {
                path: PathBuf::from(url),
            }),
        }
    }
}

/// Read and parse a JSON file.
///
/// # Errors
///
/// `LoadError::FileNotFound` for a missing path, `LoadError::ReadError` if
/// the file cannot be read, `LoadError::InvalidJson` if it does not parse.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::ReadError {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    debug!(path = %path.display(), bytes = content.len(), "read document");
    load_document_str(&content)
}

/// Parse a JSON document held in memory.
///
/// # Errors
///
/// `LoadError::InvalidJson` if `content` does not parse.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Fetch a JSON document over HTTP(S) with a blocking client.
///
/// # Errors
///
/// `LoadError::NetworkError` on connection failures, non-success statuses
/// and bodies that are not JSON.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    debug!(url, "fetching document");
    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network_error)
}

/// Returns true for `http://` and `https://` sources.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load a document from a file path or URL string.
///
/// # Errors
///
/// Whatever the selected loader returns.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    DocumentSource::parse(source).load()
}
