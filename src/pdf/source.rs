//! Document source loading
//!
//! Sources are local paths, `file://` URLs, or `http(s)://` URLs.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use log::debug;

use super::request::WorkerFault;
use super::{DEFAULT_FETCH_TIMEOUT, MAX_DOCUMENT_BYTES};

/// Fetches raw document bytes for a source string
pub trait SourceLoader: Send + 'static {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, WorkerFault>;
}

/// Where a source string points
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind<'a> {
    Remote(&'a str),
    Local(&'a Path),
}

impl<'a> SourceKind<'a> {
    #[must_use]
    pub fn parse(source: &'a str) -> Self {
        let lower = source.get(..8).unwrap_or(source).to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote(source)
        } else if let Some(path) = source.strip_prefix("file://") {
            Self::Local(Path::new(path))
        } else {
            Self::Local(Path::new(source))
        }
    }
}

/// Loads local files directly and remote documents over HTTP
pub struct DefaultSourceLoader {
    agent: ureq::Agent,
}

impl Default for DefaultSourceLoader {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl DefaultSourceLoader {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, WorkerFault> {
        let resp = self
            .agent
            .get(url)
            .set("Accept", "application/pdf")
            .call()
            .map_err(|e| WorkerFault::fetch(url, e.to_string()))?;

        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_DOCUMENT_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| WorkerFault::fetch(url, e.to_string()))?;

        if bytes.len() as u64 > MAX_DOCUMENT_BYTES {
            return Err(WorkerFault::fetch(
                url,
                format!("document exceeds {MAX_DOCUMENT_BYTES} bytes"),
            ));
        }
        Ok(bytes)
    }
}

impl SourceLoader for DefaultSourceLoader {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, WorkerFault> {
        match SourceKind::parse(source) {
            SourceKind::Remote(url) => {
                debug!("Fetching remote document {url}");
                self.fetch_remote(url)
            }
            SourceKind::Local(path) => {
                debug!("Reading local document {path:?}");
                fs::read(path).map_err(|e| WorkerFault::fetch(source, e.to_string()))
            }
        }
    }
}
