//! Drives a running backend through the client-side sources and pages.

use std::sync::Arc;

use knowledgebank::config::UiConfig;
use knowledgebank::page::{HomePage, Markup, ResourcesPage, UploadPage};
use knowledgebank::render::{Node, Tone};
use knowledgebank::server::{router, AppState};
use knowledgebank::source::{
    ApiSource, DataSource, DocumentLocation, SourceContext, StaticSource, UploadFile,
};
use knowledgebank::{Resource, Store};
use tempfile::TempDir;

struct Backend {
    base_url: String,
    dir: TempDir,
}

async fn spawn_backend() -> Backend {
    let dir = TempDir::new().unwrap();
    let uploads = dir.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();

    let store = Store::open(dir.path().join("resources.db")).unwrap();
    store
        .import(&[
            Resource::new("Solar Guide", "pdf")
                .with_description("Rooftop panels")
                .with_tags(["energy"]),
            Resource::new("Wind Report", "doc")
                .with_tags(["energy", "policy"])
                .with_url("https://example.org/wind"),
        ])
        .unwrap();

    let app = router(AppState::new(store, uploads, UiConfig::default()), 1024 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend {
        base_url: format!("http://{addr}"),
        dir,
    }
}

fn titles(resources: &[Resource]) -> Vec<&str> {
    resources.iter().map(|r| r.title.as_str()).collect()
}

#[tokio::test]
async fn api_source_filters_on_the_backend() {
    let backend = spawn_backend().await;
    let api = ApiSource::new(reqwest::Client::new(), &format!("{}/", backend.base_url));

    let all = api.fetch_all().await.unwrap();
    assert_eq!(titles(&all), vec!["Solar Guide", "Wind Report"]);

    let solar = api.search("rooftop", "").await.unwrap();
    assert_eq!(titles(&solar), vec!["Solar Guide"]);

    let docs = api.search("", "DOC").await.unwrap();
    assert_eq!(titles(&docs), vec!["Wind Report"]);
}

#[tokio::test]
async fn api_source_reports_error_status() {
    let backend = spawn_backend().await;
    let api = ApiSource::new(
        reqwest::Client::new(),
        &format!("{}/missing", backend.base_url),
    );

    let err = api.fetch_all().await.unwrap_err();
    assert!(err.is_load_failure());
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn static_source_fetches_document_once() {
    let backend = spawn_backend().await;
    let context = SourceContext::new();
    let source = StaticSource::new(
        reqwest::Client::new(),
        DocumentLocation::parse(&format!("{}/api/resources", backend.base_url)),
        context.clone(),
    );

    assert!(!context.is_loaded());
    let energy = source.search("", "").await.unwrap();
    assert_eq!(energy.len(), 2);
    assert!(context.is_loaded());

    // Rows added after the first load are not seen by the cached document.
    let api = ApiSource::new(reqwest::Client::new(), &backend.base_url);
    let mut page = UploadPage::mount(&Markup::upload(), api, &UiConfig::default()).unwrap();
    page.form_mut().title = "Tidal Study".to_string();
    assert!(page.submit().await);

    assert_eq!(source.fetch_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn upload_page_round_trip() {
    let backend = spawn_backend().await;
    let api = ApiSource::new(reqwest::Client::new(), &backend.base_url);
    let ui = UiConfig::default();

    let mut page = UploadPage::mount(&Markup::upload(), api.clone(), &ui).unwrap();
    {
        let form = page.form_mut();
        form.description = "Measurements".to_string();
        form.resource_type = "dataset".to_string();
        form.tags = "ocean, energy".to_string();
        form.file = Some(UploadFile {
            name: "tides.csv".to_string(),
            bytes: b"t,h\n1,2\n".to_vec(),
        });
    }

    assert!(page.submit().await);
    assert!(page.form().is_blank());
    assert_eq!(page.message().messages(), vec![ui.upload_success.as_str()]);
    assert!(matches!(
        page.message().nodes(),
        [Node::Message {
            tone: Tone::Success,
            ..
        }]
    ));

    let datasets = api.search("", "dataset").await.unwrap();
    assert_eq!(titles(&datasets), vec!["tides.csv"]);
    assert_eq!(datasets[0].file(), Some("tides.csv"));
    assert_eq!(datasets[0].tags, vec!["ocean", "energy"]);
    assert!(backend.dir.path().join("uploads/tides.csv").exists());

    let served = reqwest::get(format!("{}/uploads/tides.csv", backend.base_url))
        .await
        .unwrap();
    assert!(served.status().is_success());
    assert_eq!(
        served.headers()["access-control-allow-origin"],
        "*"
    );
    assert_eq!(served.text().await.unwrap(), "t,h\n1,2\n");
}

#[tokio::test]
async fn upload_page_keeps_form_when_backend_rejects() {
    let backend = spawn_backend().await;
    let ui = UiConfig::default();

    let api = ApiSource::new(reqwest::Client::new(), &backend.base_url);
    let mut page = UploadPage::mount(&Markup::upload(), api.clone(), &ui).unwrap();
    {
        let form = page.form_mut();
        form.title = "Escape".to_string();
        form.tags = "misc".to_string();
        form.file = Some(UploadFile {
            name: "../".to_string(),
            bytes: b"nope".to_vec(),
        });
    }
    let entered = page.form().clone();

    assert!(!page.submit().await);
    assert_eq!(page.form(), &entered);
    assert_eq!(page.message().messages(), vec![ui.upload_failure.as_str()]);
    assert!(matches!(
        page.message().nodes(),
        [Node::Message {
            tone: Tone::Error,
            ..
        }]
    ));
    assert_eq!(api.fetch_all().await.unwrap().len(), 2);

    let missing = ApiSource::new(
        reqwest::Client::new(),
        &format!("{}/missing", backend.base_url),
    );
    let mut page = UploadPage::mount(&Markup::upload(), missing, &ui).unwrap();
    page.form_mut().title = "Lost".to_string();

    assert!(!page.submit().await);
    assert_eq!(page.form().title, "Lost");
    assert!(matches!(
        page.message().nodes(),
        [Node::Message {
            tone: Tone::Error,
            ..
        }]
    ));
}

#[tokio::test]
async fn api_source_sends_query_as_given() {
    let backend = spawn_backend().await;
    let api = ApiSource::new(reqwest::Client::new(), &backend.base_url);

    assert_eq!(titles(&api.search("wind", "").await.unwrap()), vec!["Wind Report"]);
    assert!(api.search(" wind", "").await.unwrap().is_empty());
    assert_eq!(titles(&api.search("d r", "").await.unwrap()), vec!["Wind Report"]);
}

#[tokio::test]
async fn pages_over_the_api() {
    let backend = spawn_backend().await;
    let source: Arc<dyn DataSource> = Arc::new(ApiSource::new(
        reqwest::Client::new(),
        &backend.base_url,
    ));
    let ui = UiConfig::default();

    let home = HomePage::mount(&Markup::home(), source.clone(), &ui).unwrap();
    home.submit_query("wind");
    home.choose_type("").await;
    let results = home.results().to_html();
    assert!(results.contains("Wind Report"));
    assert!(results.contains(r#"href="https://example.org/wind""#));

    let resources = ResourcesPage::mount(&Markup::resources(), source, &ui).unwrap();
    resources.load().await;
    resources.select_tag("policy");
    assert_eq!(resources.list().card_count(), 1);
}
