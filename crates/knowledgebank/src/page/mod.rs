//! Page controllers.
//!
//! Each page is a small state machine that reacts to user actions and writes
//! rendered nodes into named containers. Pages are mounted against a
//! [`Markup`] description of the element ids present; a page whose required
//! elements are missing is never mounted, so its actions silently do nothing.
//!
//! Results containers live in a [`ResultsSlot`]: an action takes a ticket
//! before it starts fetching and its output is applied only if no newer
//! action has started since.

mod home;
mod resources;
mod upload;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::render::{escape_html, Container};

pub use home::{HomePage, HomeState};
pub use resources::ResourcesPage;
pub use upload::UploadPage;

/// Element ids shared with the page markup.
pub mod ids {
    /// Text input holding the search query.
    pub const SEARCH_INPUT: &str = "search-input";
    /// Button submitting the query.
    pub const SEARCH_BUTTON: &str = "search-button";
    /// Container of type buttons.
    pub const TYPE_SELECT: &str = "type-select";
    /// Home page results container.
    pub const SEARCH_RESULTS: &str = "search-results";
    /// Resources page list container.
    pub const RESOURCE_LIST: &str = "resource-list";
    /// Container of tag buttons.
    pub const TAG_FILTER: &str = "tag-filter";
    /// The upload form.
    pub const UPLOAD_FORM: &str = "upload-form";
    /// Upload status container.
    pub const UPLOAD_MESSAGE: &str = "upload-message";
}

/// The set of element ids a page provides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    ids: BTreeSet<String>,
}

impl Markup {
    /// Describe markup containing the given ids.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// The standard home page.
    #[must_use]
    pub fn home() -> Self {
        Self::new(HomePage::REQUIRED_IDS.iter().copied())
    }

    /// The standard resources page.
    #[must_use]
    pub fn resources() -> Self {
        Self::new(ResourcesPage::REQUIRED_IDS.iter().copied())
    }

    /// The standard upload page.
    #[must_use]
    pub fn upload() -> Self {
        Self::new(UploadPage::REQUIRED_IDS.iter().copied())
    }

    /// Drop an id from the description.
    #[must_use]
    pub fn without(mut self, id: &str) -> Self {
        self.ids.remove(id);
        self
    }

    /// Check whether an element is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Check that every required id is present, logging the first one missing.
    fn provides(&self, page: &str, required: &[&str]) -> bool {
        match required.iter().find(|id| !self.contains(id)) {
            Some(missing) => {
                debug!(page, missing, "Page markup incomplete, controller not mounted");
                false
            }
            None => true,
        }
    }
}

/// A clickable filter control: what it shows and the value it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterControl {
    /// Text shown to the user.
    pub label: String,
    /// Value applied when clicked; empty means "all".
    pub value: String,
}

impl FilterControl {
    /// Create a control.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Check whether this control selects `value`, ignoring case.
    #[must_use]
    pub fn selects(&self, value: &str) -> bool {
        self.value.to_lowercase() == value.trim().to_lowercase()
    }

    /// Render as a submit button of a GET form.
    ///
    /// `param` is the query parameter name and `data_attr` the data attribute
    /// carried by the button (`type` or `tag`).
    #[must_use]
    pub fn to_button(&self, param: &str, data_attr: &str, active: bool) -> String {
        let class = if active { "filter-btn active" } else { "filter-btn" };
        let value = escape_html(&self.value);
        format!(
            r#"<button type="submit" class="{class}" name="{param}" value="{value}" data-{data_attr}="{value}">{}</button>"#,
            escape_html(&self.label)
        )
    }
}

/// Proof that an action started; results are applied only for the newest ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
struct SlotInner {
    generation: AtomicU64,
    container: Mutex<Container>,
}

/// A results container guarded by a generation counter.
#[derive(Debug, Clone)]
pub struct ResultsSlot {
    inner: Arc<SlotInner>,
}

impl ResultsSlot {
    /// Create a slot around an empty container.
    #[must_use]
    pub fn new(id: &'static str) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                generation: AtomicU64::new(0),
                container: Mutex::new(Container::new(id)),
            }),
        }
    }

    /// Start a new action, invalidating every earlier ticket.
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        Ticket(self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply `update` if `ticket` is still the newest. Returns whether it ran.
    pub fn apply(&self, ticket: Ticket, update: impl FnOnce(&mut Container)) -> bool {
        let mut container = self
            .inner
            .container
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.inner.generation.load(Ordering::SeqCst) != ticket.0 {
            debug!(
                container = container.id(),
                ticket = ticket.0,
                "Discarding stale result"
            );
            return false;
        }
        update(&mut container);
        true
    }

    /// Start and immediately apply an action that needs no fetch.
    pub fn update(&self, update: impl FnOnce(&mut Container)) {
        let ticket = self.ticket();
        self.apply(ticket, update);
    }

    /// A copy of the current container.
    #[must_use]
    pub fn snapshot(&self) -> Container {
        self.inner
            .container
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
