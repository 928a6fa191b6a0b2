//! JSON API handlers.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::filter::FilterQuery;
use crate::resource::Resource;

use super::{uploads, ApiError, AppState};

/// Query parameters of the listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ListParams {
    q: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
    tag: Option<String>,
}

impl ListParams {
    fn filter(&self) -> FilterQuery {
        FilterQuery::new(
            self.q.as_deref(),
            self.resource_type.as_deref(),
            self.tag.as_deref(),
        )
    }
}

/// `GET /api/resources`
pub(super) async fn list_resources(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let query = params.filter();
    let all = state.list()?;
    let matched = query.apply(&all);
    debug!(?query, total = all.len(), matched = matched.len(), "Listed resources");
    Ok(Json(matched))
}

/// Text fields and the optional file of an upload request.
#[derive(Debug, Default)]
struct UploadFields {
    title: String,
    description: String,
    resource_type: String,
    tags: String,
    url: String,
    file: Option<(String, Vec<u8>)>,
}

impl UploadFields {
    async fn read(mut multipart: Multipart) -> Result<Self, Error> {
        let mut fields = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let client_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                // An empty file input still sends a part, without a name.
                if let Some(client_name) = client_name.filter(|n| !n.trim().is_empty()) {
                    fields.file = Some((client_name, bytes.to_vec()));
                }
                continue;
            }

            let value = field.text().await.map_err(malformed)?.trim().to_string();
            match name.as_str() {
                "title" => fields.title = value,
                "description" => fields.description = value,
                "type" => fields.resource_type = value,
                "tags" => fields.tags = value,
                "url" => fields.url = value,
                other => debug!(field = other, "Ignoring unknown upload field"),
            }
        }
        Ok(fields)
    }
}

fn malformed(err: MultipartError) -> Error {
    Error::invalid_upload(err.body_text())
}

/// Split a comma separated tag list, dropping empty items.
pub(super) fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// `POST /api/upload`
pub(super) async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let multipart = multipart.map_err(|e| Error::invalid_upload(e.body_text()))?;
    let fields = UploadFields::read(multipart).await?;

    let mut resource = Resource::new(fields.title, fields.resource_type)
        .with_description(fields.description)
        .with_tags(parse_tags(&fields.tags));
    if !fields.url.is_empty() {
        resource = resource.with_url(fields.url);
    }

    let mut saved = None;
    if let Some((client_name, bytes)) = fields.file {
        let stored = uploads::save(&state.uploads_dir, &client_name, &bytes).await?;
        if resource.title.is_empty() {
            resource.title = client_name;
        }
        saved = Some(state.uploads_dir.join(&stored));
        resource = resource.with_file(stored);
    }

    if let Err(err) = state.insert(&resource) {
        // A stored file without a catalog row would never be listed.
        if let Some(path) = saved {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                warn!(
                    path = %path.display(),
                    error = %remove_err,
                    "Failed to remove orphaned upload"
                );
            }
        }
        return Err(err.into());
    }
    info!(
        title = %resource.title,
        file = resource.file().unwrap_or_default(),
        "Resource uploaded"
    );
    Ok((StatusCode::CREATED, Json(resource)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(" energy, ,solar ,"), vec!["energy", "solar"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_list_params_filter() {
        let params = ListParams {
            q: Some(" Solar ".to_string()),
            resource_type: Some(String::new()),
            tag: None,
        };
        let query = params.filter();
        assert_eq!(query.query, " solar ");
        assert_eq!(query, FilterQuery::new(Some(" solar "), None, None));
    }
}
