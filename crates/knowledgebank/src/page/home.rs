//! Home page: search box, type selector, results.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::config::UiConfig;
use crate::render::{escape_html, Node, Renderer};
use crate::source::DataSource;

use super::{ids, FilterControl, Markup, ResultsSlot};

/// Where the home page is in its search flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HomeState {
    /// Nothing searched yet, or the last submission was empty.
    #[default]
    Idle,
    /// A query was entered; the type selector is shown.
    ChoosingType {
        /// The submitted query.
        query: String,
    },
    /// Results for a query and type are shown.
    Showing {
        /// The submitted query.
        query: String,
        /// The chosen type; empty means any.
        resource_type: String,
    },
}

impl HomeState {
    fn query(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::ChoosingType { query } | Self::Showing { query, .. } => Some(query),
        }
    }
}

/// Controller for the home/search page.
#[derive(Debug)]
pub struct HomePage {
    source: Arc<dyn DataSource>,
    renderer: Renderer,
    search_prompt: String,
    load_error: String,
    type_controls: Vec<FilterControl>,
    state: Mutex<HomeState>,
    results: ResultsSlot,
}

impl HomePage {
    /// Element ids the page needs.
    pub const REQUIRED_IDS: [&'static str; 4] = [
        ids::SEARCH_INPUT,
        ids::SEARCH_BUTTON,
        ids::TYPE_SELECT,
        ids::SEARCH_RESULTS,
    ];

    /// Mount the controller, or return `None` if the markup lacks a required element.
    #[must_use]
    pub fn mount(markup: &Markup, source: Arc<dyn DataSource>, ui: &UiConfig) -> Option<Self> {
        if !markup.provides("home", &Self::REQUIRED_IDS) {
            return None;
        }

        let mut type_controls = vec![FilterControl::new(ui.all_label.clone(), "")];
        type_controls.extend(ui.types.iter().map(|t| FilterControl::new(t.clone(), t.clone())));

        Some(Self {
            renderer: Renderer::new(ui, source.file_links()),
            source,
            search_prompt: ui.search_prompt.clone(),
            load_error: ui.load_error.clone(),
            type_controls,
            state: Mutex::new(HomeState::Idle),
            results: ResultsSlot::new(ids::SEARCH_RESULTS),
        })
    }

    fn set_state(&self, state: HomeState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> HomeState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the type selector is shown.
    #[must_use]
    pub fn type_selector_visible(&self) -> bool {
        self.state().query().is_some()
    }

    /// The type buttons, "all" first.
    #[must_use]
    pub fn type_controls(&self) -> &[FilterControl] {
        &self.type_controls
    }

    /// The results container.
    #[must_use]
    pub fn results(&self) -> crate::render::Container {
        self.results.snapshot()
    }

    /// The search button was clicked with `input` in the search box.
    ///
    /// An empty query shows the prompt and hides the type selector without
    /// fetching anything.
    pub fn submit_query(&self, input: &str) {
        let query = input.trim();
        if query.is_empty() {
            debug!("Empty search submitted");
            self.set_state(HomeState::Idle);
            let prompt = self.search_prompt.clone();
            self.results.update(|c| c.show_message(Node::info(prompt)));
            return;
        }

        debug!(query, "Search submitted, choosing type");
        self.set_state(HomeState::ChoosingType {
            query: query.to_string(),
        });
    }

    /// A type button was clicked. Fetches, filters and renders the results.
    ///
    /// Does nothing while no query has been submitted.
    pub async fn choose_type(&self, resource_type: &str) {
        let Some(query) = self.state().query().map(String::from) else {
            debug!("Type chosen without a query, ignoring");
            return;
        };
        let resource_type = resource_type.trim().to_string();

        let ticket = self.results.ticket();
        self.set_state(HomeState::Showing {
            query: query.clone(),
            resource_type: resource_type.clone(),
        });

        match self.source.search(&query, &resource_type).await {
            Ok(items) => {
                debug!(query = %query, resource_type = %resource_type, count = items.len(), "Search finished");
                self.results
                    .apply(ticket, |c| self.renderer.render(&items, c));
            }
            Err(e) => {
                warn!(error = %e, query = %query, "Search failed");
                let message = self.load_error.clone();
                self.results
                    .apply(ticket, |c| c.show_message(Node::error(message)));
            }
        }
    }

    /// Render the page body with its controls and results.
    #[must_use]
    pub fn to_html(&self) -> String {
        let state = self.state();
        let query = state.query().unwrap_or_default();
        let active_type = match &state {
            HomeState::Showing { resource_type, .. } => Some(resource_type.as_str()),
            _ => None,
        };

        let buttons: String = self
            .type_controls
            .iter()
            .map(|c| c.to_button("type", "type", active_type.is_some_and(|t| c.selects(t))))
            .collect();
        let hidden = if self.type_selector_visible() { "" } else { " hidden" };

        format!(
            concat!(
                r#"<form method="get" action="/">"#,
                r#"<input id="{input}" type="text" name="q" value="{query}">"#,
                r#"<button id="{button}" type="submit" name="search" value="1">Search</button>"#,
                "</form>",
                r#"<form id="{select}" method="get" action="/"{hidden}>"#,
                r#"<input type="hidden" name="q" value="{query}">{buttons}</form>"#,
                "{results}"
            ),
            input = ids::SEARCH_INPUT,
            button = ids::SEARCH_BUTTON,
            select = ids::TYPE_SELECT,
            query = escape_html(query),
            hidden = hidden,
            buttons = buttons,
            results = self.results().to_html(),
        )
    }
}
