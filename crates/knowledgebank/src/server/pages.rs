//! Server-rendered pages.
//!
//! The pages are driven by the same controllers a client would use, reading
//! the local store. Every interaction is a plain GET form, so the query
//! string replays the user's clicks.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;

use crate::error::Error;
use crate::page::{ids, HomePage, Markup, ResourcesPage};
use crate::render::escape_html;
use crate::source::{DataSource, StoreSource};

use super::{ApiError, AppState};

/// Wrap a page body in the shared layout.
fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            "<title>{title} | Knowledge Bank</title></head><body>",
            r#"<nav><a href="/">Search</a> <a href="/resources">Resources</a> <a href="/upload">Upload</a></nav>"#,
            "<main><h1>{title}</h1>{body}</main></body></html>"
        ),
        title = escape_html(title),
        body = body,
    ))
}

fn store_source(state: &AppState) -> Arc<dyn DataSource> {
    Arc::new(StoreSource::new(state.store.clone()))
}

/// Query parameters of the home page.
#[derive(Debug, Default, Deserialize)]
pub(super) struct HomeParams {
    q: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
    search: Option<String>,
}

/// `GET /`
pub(super) async fn home(
    State(state): State<AppState>,
    Query(params): Query<HomeParams>,
) -> Result<Html<String>, ApiError> {
    let page = HomePage::mount(&Markup::home(), store_source(&state), &state.ui)
        .ok_or_else(|| Error::internal("home page markup incomplete"))?;

    if params.q.is_some() || params.search.is_some() {
        page.submit_query(params.q.as_deref().unwrap_or_default());
        if let Some(resource_type) = &params.resource_type {
            page.choose_type(resource_type).await;
        }
    }

    Ok(layout("Search", &page.to_html()))
}

/// Query parameters of the resources page.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ResourcesParams {
    tag: Option<String>,
}

/// `GET /resources`
pub(super) async fn resources(
    State(state): State<AppState>,
    Query(params): Query<ResourcesParams>,
) -> Result<Html<String>, ApiError> {
    let page = ResourcesPage::mount(&Markup::resources(), store_source(&state), &state.ui)
        .ok_or_else(|| Error::internal("resources page markup incomplete"))?;

    page.load().await;
    if let Some(tag) = &params.tag {
        page.select_tag(tag);
    }

    Ok(layout("Resources", &page.to_html()))
}

/// `GET /upload`
pub(super) async fn upload(State(state): State<AppState>) -> Html<String> {
    let types: String = state
        .ui
        .types
        .iter()
        .map(|t| {
            let t = escape_html(t);
            format!(r#"<option value="{t}">{t}</option>"#)
        })
        .collect();

    let body = format!(
        concat!(
            r#"<form id="{form}" method="post" action="/api/upload" enctype="multipart/form-data">"#,
            r#"<label>Title <input type="text" name="title"></label>"#,
            r#"<label>Description <textarea name="description"></textarea></label>"#,
            r#"<label>Type <select name="type">{types}</select></label>"#,
            r#"<label>Tags <input type="text" name="tags" placeholder="comma, separated"></label>"#,
            r#"<label>URL <input type="url" name="url"></label>"#,
            r#"<label>File <input type="file" name="file"></label>"#,
            r#"<button type="submit">Upload</button>"#,
            "</form>",
            r#"<div id="{message}"></div>"#
        ),
        form = ids::UPLOAD_FORM,
        message = ids::UPLOAD_MESSAGE,
        types = types,
    );
    layout("Upload", &body)
}
