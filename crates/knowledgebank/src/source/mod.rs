//! Data source adapters.
//!
//! A [`DataSource`] hands the page controllers a resource collection. Three
//! adapters exist:
//!
//! - [`StaticSource`]: one JSON document, fetched once and filtered locally.
//! - [`ApiSource`]: a backend that filters per request.
//! - [`StoreSource`]: the local store, used by the server's own pages.

mod api;
mod document;
mod store;

use std::sync::Arc;

use crate::config::{Config, SourceKind};
use crate::error::Result;
use crate::render::FileLinks;
use crate::resource::Resource;

pub use api::{ApiSource, UploadFile, UploadForm};
pub(crate) use api::{RESOURCES_PATH, UPLOAD_PATH};
pub use document::{DocumentLocation, SourceContext, StaticSource};
pub use store::StoreSource;

/// Something that can produce the resource collection.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync + std::fmt::Debug {
    /// Fetch the whole collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded or parsed.
    async fn fetch_all(&self) -> Result<Vec<Resource>>;

    /// Fetch resources matching a text query and a type.
    ///
    /// Empty arguments are unconstrained.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded or parsed.
    async fn search(&self, query: &str, resource_type: &str) -> Result<Vec<Resource>>;

    /// Whether this deployment can serve uploaded files.
    fn file_links(&self) -> FileLinks;
}

/// Build an HTTP client honoring the configured timeout.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("knowledgebank/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Build the adapter selected by the configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn from_config(config: &Config) -> Result<Arc<dyn DataSource>> {
    let client = http_client(config)?;
    let source: Arc<dyn DataSource> = match config.source.kind {
        SourceKind::Static => {
            let source = StaticSource::new(
                client,
                DocumentLocation::parse(&config.source.location),
                SourceContext::new(),
            );
            tracing::debug!(location = %source.location(), "Using static document");
            Arc::new(source)
        }
        SourceKind::Api => {
            let source = ApiSource::new(client, &config.source.api_base_url);
            tracing::debug!(base_url = %source.base_url(), "Using backend API");
            Arc::new(source)
        }
    };
    Ok(source)
}
