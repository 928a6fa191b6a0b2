//! Core resource types for knowledgebank.
//!
//! A [`Resource`] is a single catalog entry. Records come from external JSON
//! documents that are not always tidy, so decoding is lenient: missing or
//! `null` text fields become empty and empty links count as absent.

use serde::{Deserialize, Deserializer, Serialize};

/// A single catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    /// Display name.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,

    /// Free-text description.
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,

    /// Category label, compared case-insensitively.
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub resource_type: String,

    /// Ordered tag labels.
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    /// External link.
    pub url: Option<String>,

    /// Name of an uploaded file served by the backend.
    pub file: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The action a resource card offers, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link<'a> {
    /// An external URL.
    External(&'a str),
    /// A stored upload.
    File(&'a str),
}

impl Resource {
    /// Create a resource with a title and type.
    #[must_use]
    pub fn new(title: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the external link.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the uploaded file name.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// The external URL, ignoring blank values.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }

    /// The uploaded file name, ignoring blank values.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        non_blank(self.file.as_deref())
    }

    /// The preferred action: the URL wins over the file.
    #[must_use]
    pub fn link(&self) -> Option<Link<'_>> {
        self.url()
            .map(Link::External)
            .or_else(|| self.file().map(Link::File))
    }

    /// Check whether any tag equals `tag`, ignoring case.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a JSON document holding an array of resources.
///
/// # Errors
///
/// Returns an error if the document is not a JSON array of resource objects.
pub fn parse_collection(document: &[u8]) -> crate::Result<Vec<Resource>> {
    Ok(serde_json::from_slice(document)?)
}
