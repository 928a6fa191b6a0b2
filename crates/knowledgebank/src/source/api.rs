//! Backend API source and upload client.

use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::render::FileLinks;
use crate::resource::Resource;

use super::DataSource;

/// Path of the listing endpoint.
pub(crate) const RESOURCES_PATH: &str = "/api/resources";

/// Path of the upload endpoint.
pub(crate) const UPLOAD_PATH: &str = "/api/upload";

/// A file attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Client-side file name.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// The fields of the upload form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    /// Resource title.
    pub title: String,
    /// Resource description.
    pub description: String,
    /// Resource type.
    pub resource_type: String,
    /// Comma separated tags.
    pub tags: String,
    /// External link.
    pub url: String,
    /// Attached file.
    pub file: Option<UploadFile>,
}

impl UploadForm {
    /// Check whether nothing has been entered.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    fn into_multipart(self) -> Form {
        let mut form = Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("type", self.resource_type)
            .text("tags", self.tags)
            .text("url", self.url);
        if let Some(file) = self.file {
            form = form.part("file", Part::bytes(file.bytes).file_name(file.name));
        }
        form
    }
}

/// A data source that asks the backend on every call.
#[derive(Debug, Clone)]
pub struct ApiSource {
    client: reqwest::Client,
    base_url: String,
}

impl ApiSource {
    /// Create a source talking to the backend at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// The backend base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Query the listing endpoint; empty parameters are left out, others are sent as given.
    async fn list(&self, params: &[(&str, &str)]) -> Result<Vec<Resource>> {
        let url = self.endpoint(RESOURCES_PATH);
        let params: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
        debug!(url = %url, ?params, "Querying backend");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::fetch(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                location: url,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| Error::fetch(&url, e))
    }

    /// Send an upload form to the backend and return the stored resource.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or any non-2xx status.
    pub async fn upload(&self, form: UploadForm) -> Result<Resource> {
        let url = self.endpoint(UPLOAD_PATH);
        let response = self
            .client
            .post(&url)
            .multipart(form.into_multipart())
            .send()
            .await
            .map_err(|e| Error::fetch(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Upload rejected");
            return Err(Error::HttpStatus {
                location: url,
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| Error::fetch(&url, e))
    }
}

#[async_trait::async_trait]
impl DataSource for ApiSource {
    async fn fetch_all(&self) -> Result<Vec<Resource>> {
        self.list(&[]).await
    }

    async fn search(&self, query: &str, resource_type: &str) -> Result<Vec<Resource>> {
        self.list(&[("q", query), ("type", resource_type)]).await
    }

    fn file_links(&self) -> FileLinks {
        FileLinks::Served
    }
}
