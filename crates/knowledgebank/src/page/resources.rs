//! Resources page: tag filter and full listing.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::config::UiConfig;
use crate::filter::{distinct_tags, filter_by_tag};
use crate::render::{Container, Node, Renderer};
use crate::resource::Resource;
use crate::source::DataSource;

use super::{ids, FilterControl, Markup, ResultsSlot};

#[derive(Debug)]
struct Loaded {
    all: Arc<[Resource]>,
    controls: Vec<FilterControl>,
    active: Option<usize>,
}

/// Controller for the resources/browse page.
#[derive(Debug)]
pub struct ResourcesPage {
    source: Arc<dyn DataSource>,
    renderer: Renderer,
    all_label: String,
    load_error: String,
    loaded: Mutex<Option<Loaded>>,
    list: ResultsSlot,
}

impl ResourcesPage {
    /// Element ids the page needs.
    pub const REQUIRED_IDS: [&'static str; 2] = [ids::TAG_FILTER, ids::RESOURCE_LIST];

    /// Mount the controller, or return `None` if the markup lacks a required element.
    #[must_use]
    pub fn mount(markup: &Markup, source: Arc<dyn DataSource>, ui: &UiConfig) -> Option<Self> {
        if !markup.provides("resources", &Self::REQUIRED_IDS) {
            return None;
        }
        Some(Self {
            renderer: Renderer::new(ui, source.file_links()),
            source,
            all_label: ui.all_label.clone(),
            load_error: ui.load_error.clone(),
            loaded: Mutex::new(None),
            list: ResultsSlot::new(ids::RESOURCE_LIST),
        })
    }

    /// Page load: fetch everything, build the tag controls, show the full list.
    pub async fn load(&self) {
        let ticket = self.list.ticket();
        let all = match self.source.fetch_all().await {
            Ok(all) => all,
            Err(e) => {
                warn!(error = %e, "Failed to load resources");
                let message = self.load_error.clone();
                self.list
                    .apply(ticket, |c| c.show_message(Node::error(message)));
                return;
            }
        };

        let mut controls = vec![FilterControl::new(self.all_label.clone(), "")];
        controls.extend(distinct_tags(&all).into_iter().map(|t| FilterControl::new(t.clone(), t)));
        debug!(
            resources = all.len(),
            tags = controls.len() - 1,
            "Resources page loaded"
        );

        let all: Arc<[Resource]> = all.into();
        self.list.apply(ticket, |c| self.renderer.render(&all, c));
        *self.lock() = Some(Loaded {
            all,
            controls,
            active: Some(0),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Loaded>> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A tag control was clicked; an empty value selects "all".
    ///
    /// The matching control becomes the only active one. Does nothing before
    /// the page has loaded.
    pub fn select_tag(&self, tag: &str) {
        let mut loaded = self.lock();
        let Some(loaded) = loaded.as_mut() else {
            debug!("Tag selected before load, ignoring");
            return;
        };

        loaded.active = loaded.controls.iter().position(|c| c.selects(tag));
        let items = filter_by_tag(&loaded.all, tag);
        debug!(tag, matched = items.len(), "Tag filter applied");
        self.list.update(|c| self.renderer.render(&items, c));
    }

    /// The tag controls with their active flags; empty before load.
    #[must_use]
    pub fn controls(&self) -> Vec<(FilterControl, bool)> {
        self.lock()
            .as_ref()
            .map(|l| {
                l.controls
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.clone(), l.active == Some(i)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The list container.
    #[must_use]
    pub fn list(&self) -> Container {
        self.list.snapshot()
    }

    /// Render the page body with its controls and list.
    #[must_use]
    pub fn to_html(&self) -> String {
        let buttons: String = self
            .controls()
            .iter()
            .map(|(c, active)| c.to_button("tag", "tag", *active))
            .collect();
        format!(
            r#"<form id="{}" method="get" action="/resources">{buttons}</form>{}"#,
            ids::TAG_FILTER,
            self.list().to_html()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::testing::{sample, FakeSource};

    fn mount(source: FakeSource) -> ResourcesPage {
        ResourcesPage::mount(&Markup::resources(), Arc::new(source), &UiConfig::default()).unwrap()
    }

    fn active_labels(page: &ResourcesPage) -> Vec<String> {
        page.controls()
            .into_iter()
            .filter(|(_, active)| *active)
            .map(|(c, _)| c.label)
            .collect()
    }

    #[test]
    fn test_mount_requires_markup() {
        let markup = Markup::resources().without(ids::TAG_FILTER);
        let mounted = ResourcesPage::mount(
            &markup,
            Arc::new(FakeSource::default()),
            &UiConfig::default(),
        );
        assert!(mounted.is_none());
    }

    #[tokio::test]
    async fn test_load_builds_controls_and_lists_everything() {
        let page = mount(FakeSource::with(sample()));
        page.load().await;

        let labels: Vec<_> = page.controls().into_iter().map(|(c, _)| c.label).collect();
        assert_eq!(labels, vec!["All", "energy", "policy"]);
        assert_eq!(active_labels(&page), vec!["All"]);
        assert_eq!(page.list().card_count(), 2);
    }

    #[tokio::test]
    async fn test_select_tag_filters_and_activates() {
        let page = mount(FakeSource::with(sample()));
        page.load().await;

        page.select_tag("policy");
        assert_eq!(active_labels(&page), vec!["policy"]);
        let list = page.list();
        assert_eq!(list.card_count(), 1);
        assert!(list.to_html().contains("Wind Report"));

        page.select_tag("");
        assert_eq!(active_labels(&page), vec!["All"]);
        assert_eq!(page.list().card_count(), 2);
    }

    #[tokio::test]
    async fn test_filters_always_start_from_full_collection() {
        let page = mount(FakeSource::with(sample()));
        page.load().await;

        page.select_tag("policy");
        page.select_tag("energy");
        assert_eq!(page.list().card_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tag_shows_no_results() {
        let page = mount(FakeSource::with(sample()));
        page.load().await;

        page.select_tag("ocean");
        assert!(active_labels(&page).is_empty());
        assert_eq!(
            page.list().messages(),
            vec![UiConfig::default().no_results]
        );
    }

    #[tokio::test]
    async fn test_select_before_load_is_ignored() {
        let source = FakeSource::with(sample());
        let page = mount(source);
        page.select_tag("energy");
        assert!(page.list().nodes().is_empty());
        assert!(page.controls().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_shows_error() {
        let page = mount(FakeSource::failing());
        page.load().await;

        assert_eq!(
            page.list().messages(),
            vec![UiConfig::default().load_error]
        );
        assert!(page.controls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let page = mount(FakeSource::default());
        page.load().await;

        assert_eq!(page.controls().len(), 1);
        assert_eq!(
            page.list().messages(),
            vec![UiConfig::default().no_results]
        );
    }

    #[tokio::test]
    async fn test_to_html_marks_active_control() {
        let page = mount(FakeSource::with(sample()));
        page.load().await;
        page.select_tag("ENERGY");

        let html = page.to_html();
        assert!(html.contains(r#"class="filter-btn active" name="tag" value="energy""#));
        assert!(html.contains(r#"class="filter-btn" name="tag" value="""#));
        assert!(html.contains(r#"id="resource-list""#));
    }
}
