//! Resource filtering.
//!
//! Filters always run over the full collection and preserve its order. Text
//! matching is case-insensitive; an empty constraint means "no constraint".

use tracing::trace;

use crate::resource::Resource;

/// A combined search over query text, type, and tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Substring looked up in title or description.
    pub query: String,
    /// Exact type label.
    pub resource_type: String,
    /// Exact tag label.
    pub tag: String,
}

impl FilterQuery {
    /// Build a query from optional parts; `None` and empty values are unconstrained.
    ///
    /// Values are lowercased but otherwise used as given, whitespace included.
    #[must_use]
    pub fn new(query: Option<&str>, resource_type: Option<&str>, tag: Option<&str>) -> Self {
        let norm = |v: Option<&str>| v.unwrap_or_default().to_lowercase();
        Self {
            query: norm(query),
            resource_type: norm(resource_type),
            tag: norm(tag),
        }
    }

    /// Check whether this query places no constraint at all.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.query.is_empty() && self.resource_type.is_empty() && self.tag.is_empty()
    }

    /// Check whether a single resource satisfies every constraint.
    #[must_use]
    pub fn matches(&self, resource: &Resource) -> bool {
        matches_text(resource, &self.query)
            && matches_type(resource, &self.resource_type)
            && (self.tag.is_empty() || resource.has_tag(&self.tag))
    }

    /// Apply the query to a collection.
    #[must_use]
    pub fn apply(&self, resources: &[Resource]) -> Vec<Resource> {
        if self.is_unconstrained() {
            return resources.to_vec();
        }
        let matched: Vec<Resource> = resources
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        trace!(
            query = %self.query,
            resource_type = %self.resource_type,
            tag = %self.tag,
            total = resources.len(),
            matched = matched.len(),
            "Filtered resources"
        );
        matched
    }
}

/// Keep resources whose title or description contains `query` and whose type equals `resource_type`.
#[must_use]
pub fn filter(resources: &[Resource], query: &str, resource_type: &str) -> Vec<Resource> {
    FilterQuery::new(Some(query), Some(resource_type), None).apply(resources)
}

/// Keep resources carrying `tag`; an empty tag keeps everything.
#[must_use]
pub fn filter_by_tag(resources: &[Resource], tag: &str) -> Vec<Resource> {
    FilterQuery::new(None, None, Some(tag)).apply(resources)
}

/// Distinct tags in first-appearance order.
///
/// Tags differing only in case collapse onto the first spelling seen, since
/// the tag filter could not tell them apart anyway.
#[must_use]
pub fn distinct_tags(resources: &[Resource]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    resources
        .iter()
        .flat_map(|r| r.tags.iter())
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .map(String::from)
        .collect()
}

fn matches_text(resource: &Resource, query: &str) -> bool {
    query.is_empty()
        || resource.title.to_lowercase().contains(query)
        || resource.description.to_lowercase().contains(query)
}

fn matches_type(resource: &Resource, resource_type: &str) -> bool {
    resource_type.is_empty() || resource.resource_type.to_lowercase() == resource_type
}
