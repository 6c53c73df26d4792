use reqwest::{StatusCode, Url};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Why a file could not be fetched from a [`Source`].
///
/// `NotFound` is kept apart from every other failure because the chapter
/// loader falls back to the raw variant on it and only on it.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status} for {path}")]
    Status { status: u16, path: String },
    #[error("transport error for {path}: {message}")]
    Transport { path: String, message: String },
    #[error("io error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document {path}: {message}")]
    Parse { path: String, message: String },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Read-only access to the static tree the generator produced.
///
/// Paths are relative (`demo/manifest.json`, `demo/raw_chapters/1.txt`).
pub trait Source: Send + Sync {
    fn fetch_text(&self, path: &str) -> Result<String, FetchError>;

    /// Human readable location, stored in the library.
    fn describe(&self) -> String;
}

pub struct HttpSource {
    client: reqwest::blocking::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Option<Duration>) -> eyre::Result<Self> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized)?;

        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("novel-reader/", env!("CARGO_PKG_VERSION")));
        // reqwest's blocking client defaults to 30s; None means wait forever
        builder = builder.timeout(timeout);
        let client = builder.build()?;

        Ok(Self { client, base })
    }

    fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(|e| FetchError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

impl Source for HttpSource {
    fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url_for(path)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response.text().map_err(|e| FetchError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

/// A local checkout of the static tree.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Source for DirSource {
    fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let full = self.root.join(path);
        tracing::debug!("read {}", full.display());

        fs::read_to_string(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(path.to_string()),
            _ => FetchError::Io {
                path: path.to_string(),
                source: e,
            },
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Build the source for a `--source` value: an http(s) URL or a directory.
pub fn open_source(location: &str, timeout: Option<Duration>) -> eyre::Result<Arc<dyn Source>> {
    if is_remote(location) {
        Ok(Arc::new(HttpSource::new(location, timeout)?))
    } else {
        Ok(Arc::new(DirSource::new(location)))
    }
}
