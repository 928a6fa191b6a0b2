//! The backend HTTP server.
//!
//! Serves the JSON API, the three pages and stored uploads from a local
//! [`Store`]. Every response allows any origin.

mod api;
mod pages;
pub mod uploads;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{Config, UiConfig};
use crate::error::{Error, Result};
use crate::render::UPLOADS_ROUTE;
use crate::resource::Resource;
use crate::source::{RESOURCES_PATH, UPLOAD_PATH};
use crate::store::Store;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    store: Arc<Mutex<Store>>,
    uploads_dir: PathBuf,
    ui: Arc<UiConfig>,
}

impl AppState {
    /// Create the state from an open store.
    #[must_use]
    pub fn new(store: Store, uploads_dir: impl Into<PathBuf>, ui: UiConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            uploads_dir: uploads_dir.into(),
            ui: Arc::new(ui),
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&Store) -> Result<T>) -> Result<T> {
        let store = self
            .store
            .lock()
            .map_err(|_| Error::internal("store lock poisoned"))?;
        f(&store)
    }

    fn list(&self) -> Result<Vec<Resource>> {
        self.with_store(Store::list)
    }

    fn insert(&self, resource: &Resource) -> Result<i64> {
        self.with_store(|store| store.insert(resource))
    }
}

/// An error returned from a handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_invalid_upload() {
            warn!(error = %self.0, "Rejected request");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let files = ServeDir::new(&state.uploads_dir);

    Router::new()
        .route("/", get(pages::home))
        .route("/resources", get(pages::resources))
        .route("/upload", get(pages::upload))
        .route(RESOURCES_PATH, get(api::list_resources))
        .route(UPLOAD_PATH, post(api::upload))
        .nest_service(UPLOADS_ROUTE, files)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the store and uploads directory named by the configuration.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the directory created.
pub fn prepare(config: &Config) -> Result<AppState> {
    let store = Store::open(config.database_path())?;
    info!(
        path = %store.path().display(),
        resources = store.count()?,
        last_added = ?store.last_added()?,
        "Opened resource store"
    );
    let uploads_dir = config.uploads_dir();
    std::fs::create_dir_all(&uploads_dir).map_err(|source| Error::DirectoryCreate {
        path: uploads_dir.clone(),
        source,
    })?;
    Ok(AppState::new(store, uploads_dir, config.ui.clone()))
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server cannot start or fails while running.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.socket_addr()?;
    let state = prepare(config)?;
    let app = router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving resources on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "kbank-test-boundary";

    struct Fixture {
        _dir: TempDir,
        uploads: PathBuf,
        app: Router,
    }

    fn fixture() -> Fixture {
        crate::logging::init_test_logging();
        let dir = TempDir::new().unwrap();
        let uploads = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();

        let store = Store::open_in_memory().unwrap();
        store
            .import(&[
                Resource::new("Solar Guide", "pdf")
                    .with_description("Panels")
                    .with_tags(["energy"]),
                Resource::new("Wind Report", "doc").with_tags(["energy", "policy"]),
            ])
            .unwrap();

        let state = AppState::new(store, &uploads, UiConfig::default());
        Fixture {
            _dir: dir,
            uploads,
            app: router(state, 1024 * 1024),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post(UPLOAD_PATH)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn titles(json: &str) -> Vec<String> {
        let resources: Vec<Resource> = serde_json::from_str(json).unwrap();
        resources.into_iter().map(|r| r.title).collect()
    }

    #[tokio::test]
    async fn test_list_resources_filters() {
        let f = fixture();

        let (status, body) = get(&f.app, "/api/resources").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&body), vec!["Solar Guide", "Wind Report"]);

        let (_, body) = get(&f.app, "/api/resources?q=PANELS").await;
        assert_eq!(titles(&body), vec!["Solar Guide"]);

        let (_, body) = get(&f.app, "/api/resources?q=&type=doc").await;
        assert_eq!(titles(&body), vec!["Wind Report"]);

        let (_, body) = get(&f.app, "/api/resources?tag=Policy").await;
        assert_eq!(titles(&body), vec!["Wind Report"]);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_file() {
        crate::logging::init_test_logging();
        let dir = TempDir::new().unwrap();
        let uploads = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        let db_path = dir.path().join("resources.db");
        let store = Store::open(&db_path).unwrap();

        rusqlite::Connection::open(&db_path)
            .unwrap()
            .execute_batch("DROP TABLE resources")
            .unwrap();

        let app = router(AppState::new(store, &uploads, UiConfig::default()), 1024 * 1024);
        let request = multipart(&[("title", "Notes")], Some(("notes.txt", b"hello")));
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("error"));
        assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_with_file_deduplicates_name() {
        let f = fixture();
        std::fs::write(f.uploads.join("notes.txt"), b"taken").unwrap();

        let request = multipart(
            &[("description", "Field notes"), ("type", "article"), ("tags", "a, ,b")],
            Some(("notes.txt", b"hello")),
        );
        let (status, body) = send(&f.app, request).await;
        assert_eq!(status, StatusCode::CREATED);

        let resource: Resource = serde_json::from_str(&body).unwrap();
        assert_eq!(resource.title, "notes.txt");
        assert_eq!(resource.tags, vec!["a", "b"]);
        assert_eq!(resource.file(), Some("notes_1.txt"));
        assert_eq!(std::fs::read(f.uploads.join("notes_1.txt")).unwrap(), b"hello");

        let (_, body) = get(&f.app, "/api/resources?type=article").await;
        assert_eq!(titles(&body), vec!["notes.txt"]);

        let (status, body) = get(&f.app, "/uploads/notes_1.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_upload_without_file() {
        let f = fixture();
        let request = multipart(
            &[("title", " Ocean Atlas "), ("type", "dataset"), ("url", "https://example.org")],
            None,
        );
        let (status, body) = send(&f.app, request).await;
        assert_eq!(status, StatusCode::CREATED);

        let resource: Resource = serde_json::from_str(&body).unwrap();
        assert_eq!(resource.title, "Ocean Atlas");
        assert_eq!(resource.url(), Some("https://example.org"));
        assert_eq!(resource.file(), None);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_multipart() {
        let f = fixture();
        let request = Request::post(UPLOAD_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, body) = send(&f.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("invalid upload"));
    }

    #[tokio::test]
    async fn test_home_page_flow() {
        let f = fixture();

        let (status, body) = get(&f.app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"id="search-input""#));
        assert!(body.contains(r#"id="type-select" method="get" action="/" hidden"#));

        let (_, body) = get(&f.app, "/?q=&search=1").await;
        assert!(body.contains(&UiConfig::default().search_prompt));

        let (_, body) = get(&f.app, "/?q=solar").await;
        assert!(body.contains(r#"id="type-select" method="get" action="/">"#));
        assert!(!body.contains("Solar Guide</h3>"));

        let (_, body) = get(&f.app, "/?q=solar&type=").await;
        assert!(body.contains("<h3>Solar Guide</h3>"));
        assert!(!body.contains("Wind Report"));
    }

    #[tokio::test]
    async fn test_resources_page_tag_filter() {
        let f = fixture();

        let (_, body) = get(&f.app, "/resources").await;
        assert!(body.contains("<h3>Solar Guide</h3>"));
        assert!(body.contains("<h3>Wind Report</h3>"));

        let (_, body) = get(&f.app, "/resources?tag=policy").await;
        assert!(!body.contains("<h3>Solar Guide</h3>"));
        assert!(body.contains(r#"class="filter-btn active" name="tag" value="policy""#));
    }

    #[tokio::test]
    async fn test_upload_page_markup() {
        let f = fixture();
        let (status, body) = get(&f.app, "/upload").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"id="upload-form""#));
        assert!(body.contains(r#"id="upload-message""#));
        assert!(body.contains(r#"enctype="multipart/form-data""#));
    }

    #[tokio::test]
    async fn test_cors_and_not_found() {
        let f = fixture();
        let request = Request::get("/api/resources")
            .header(header::ORIGIN, "http://elsewhere.test")
            .body(Body::empty())
            .unwrap();
        let response = f.app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );

        let (status, _) = get(&f.app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
