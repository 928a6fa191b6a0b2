//! Store-backed source used by the server to render its own pages.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::filter::filter;
use crate::render::FileLinks;
use crate::resource::Resource;
use crate::store::Store;

use super::DataSource;

/// A data source reading the local store.
#[derive(Debug, Clone)]
pub struct StoreSource {
    store: Arc<Mutex<Store>>,
}

impl StoreSource {
    /// Wrap a shared store.
    #[must_use]
    pub fn new(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    fn list(&self) -> Result<Vec<Resource>> {
        let store = self
            .store
            .lock()
            .map_err(|_| Error::internal("store lock poisoned"))?;
        store.list()
    }
}

#[async_trait::async_trait]
impl DataSource for StoreSource {
    async fn fetch_all(&self) -> Result<Vec<Resource>> {
        self.list()
    }

    async fn search(&self, query: &str, resource_type: &str) -> Result<Vec<Resource>> {
        Ok(filter(&self.list()?, query, resource_type))
    }

    fn file_links(&self) -> FileLinks {
        FileLinks::Served
    }
}
