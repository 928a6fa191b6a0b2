//! Static JSON document source.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::filter;
use crate::render::FileLinks;
use crate::resource::{parse_collection, Resource};

use super::DataSource;

/// Where the static document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    /// Fetched with a plain HTTP GET.
    Http(String),
    /// Read from the local file system.
    File(PathBuf),
}

impl DocumentLocation {
    /// Interpret a configured location: `http(s)://` URLs are fetched, anything else is a path.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Http(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Holds the collection once it has been loaded.
///
/// The first successful load wins; later calls reuse it. A failed load
/// leaves the context empty so the next user action loads again.
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    cache: Arc<OnceCell<Vec<Resource>>>,
}

impl SourceContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the collection has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cache.initialized()
    }
}

/// A data source backed by a single JSON document.
#[derive(Debug, Clone)]
pub struct StaticSource {
    client: reqwest::Client,
    location: DocumentLocation,
    context: SourceContext,
}

impl StaticSource {
    /// Create a source reading `location`, caching into `context`.
    #[must_use]
    pub fn new(client: reqwest::Client, location: DocumentLocation, context: SourceContext) -> Self {
        Self {
            client,
            location,
            context,
        }
    }

    /// The document location.
    #[must_use]
    pub fn location(&self) -> &DocumentLocation {
        &self.location
    }

    async fn cached(&self) -> Result<&Vec<Resource>> {
        self.context
            .cache
            .get_or_try_init(|| self.load())
            .await
    }

    async fn load(&self) -> Result<Vec<Resource>> {
        debug!(location = %self.location, "Loading resource document");
        let body = match &self.location {
            DocumentLocation::Http(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| Error::fetch(url, e))?;
                if !response.status().is_success() {
                    return Err(Error::HttpStatus {
                        location: url.clone(),
                        status: response.status().as_u16(),
                    });
                }
                response.bytes().await.map_err(|e| Error::fetch(url, e))?.to_vec()
            }
            DocumentLocation::File(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| Error::FileRead {
                        path: path.clone(),
                        source,
                    })?
            }
        };

        let resources = parse_collection(&body)?;
        info!(count = resources.len(), location = %self.location, "Loaded resource document");
        Ok(resources)
    }
}

#[async_trait::async_trait]
impl DataSource for StaticSource {
    async fn fetch_all(&self) -> Result<Vec<Resource>> {
        Ok(self.cached().await?.clone())
    }

    async fn search(&self, query: &str, resource_type: &str) -> Result<Vec<Resource>> {
        Ok(filter(self.cached().await?, query, resource_type))
    }

    fn file_links(&self) -> FileLinks {
        FileLinks::Unsupported
    }
}
