//! Rendering of resources into HTML result containers.
//!
//! Every user-supplied string goes through [`escape_html`] before it reaches
//! markup, attribute values included. A missing escape here is an XSS hole.

use std::fmt::Write as _;

use crate::config::UiConfig;
use crate::resource::{Link, Resource};

/// Route under which the backend serves uploaded files.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Schemes an external link may use.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Escape the five HTML-reserved characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Return the URL if it is safe to use as a link target.
///
/// Absolute URLs must use an allowed scheme; scheme-less (relative) URLs pass.
#[must_use]
pub fn sanitize_url(url: &str) -> Option<&str> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    // Browsers ignore embedded whitespace and control characters when parsing
    // the scheme, so "java\tscript:" must not slip through as relative.
    if url.chars().any(char::is_control) {
        return None;
    }
    match url.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => {
            let scheme = scheme.to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str()).then_some(url)
        }
        _ => Some(url),
    }
}

/// Tone of a message node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    /// Neutral information (no results, prompts).
    #[default]
    Info,
    /// Positive confirmation.
    Success,
    /// Failure, shown in red.
    Error,
}

/// A single node placed in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A text message.
    Message {
        /// Unescaped message text.
        text: String,
        /// How the message is styled.
        tone: Tone,
    },
    /// A rendered resource card (already escaped HTML).
    Card(String),
}

impl Node {
    /// Build an informational message.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            tone: Tone::Info,
        }
    }

    /// Build an error message.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            tone: Tone::Error,
        }
    }

    /// Build a success message.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            tone: Tone::Success,
        }
    }

    /// Render the node as HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Message { text, tone } => {
                let text = escape_html(text);
                match tone {
                    Tone::Info => format!(r#"<p class="message">{text}</p>"#),
                    Tone::Success => {
                        format!(r#"<p class="message success" style="color: green;">{text}</p>"#)
                    }
                    Tone::Error => {
                        format!(r#"<p class="message error" style="color: red;">{text}</p>"#)
                    }
                }
            }
            Self::Card(html) => html.clone(),
        }
    }
}

/// A named element of the page that receives rendered nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    id: &'static str,
    nodes: Vec<Node>,
}

impl Container {
    /// Create an empty container with the given element id.
    #[must_use]
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            nodes: Vec::new(),
        }
    }

    /// The element id.
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Remove all content.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Append a node.
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Replace all content with a single message.
    pub fn show_message(&mut self, node: Node) {
        self.clear();
        self.push(node);
    }

    /// The current nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of resource cards.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Card(_)))
            .count()
    }

    /// Text of every message node, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Message { text, .. } => Some(text.as_str()),
                Node::Card(_) => None,
            })
            .collect()
    }

    /// Inner HTML of the container.
    #[must_use]
    pub fn inner_html(&self) -> String {
        self.nodes.iter().map(Node::to_html).collect()
    }

    /// The container element with its content.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(r#"<div id="{}">{}</div>"#, self.id, self.inner_html())
    }
}

/// How `file`-backed resources are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLinks {
    /// The deployment serves uploads under [`UPLOADS_ROUTE`].
    Served,
    /// No upload serving; show a plain note instead of a link.
    Unsupported,
}

/// Renders resource lists into containers.
#[derive(Debug, Clone)]
pub struct Renderer {
    file_links: FileLinks,
    no_results: String,
    download_unavailable: String,
}

impl Renderer {
    /// Create a renderer using the configured texts.
    #[must_use]
    pub fn new(ui: &UiConfig, file_links: FileLinks) -> Self {
        Self {
            file_links,
            no_results: ui.no_results.clone(),
            download_unavailable: ui.download_unavailable.clone(),
        }
    }

    /// Clear the container and render `items` into it.
    ///
    /// An empty list renders exactly one "no results" message.
    pub fn render(&self, items: &[Resource], container: &mut Container) {
        container.clear();
        if items.is_empty() {
            container.push(Node::info(self.no_results.clone()));
            return;
        }
        for item in items {
            container.push(Node::Card(self.card(item)));
        }
    }

    /// Render one resource card.
    #[must_use]
    pub fn card(&self, resource: &Resource) -> String {
        let mut html = String::from(r#"<div class="resource-item">"#);
        let _ = write!(html, "<h3>{}</h3>", escape_html(&resource.title));
        let _ = write!(html, "<p>{}</p>", escape_html(&resource.description));

        if !resource.tags.is_empty() {
            let tags = resource
                .tags
                .iter()
                .map(|t| escape_html(t))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(html, r#"<p class="tags">Tags: {tags}</p>"#);
        }

        if let Some(action) = self.action(resource) {
            html.push_str(&action);
        }

        html.push_str("</div>");
        html
    }

    fn action(&self, resource: &Resource) -> Option<String> {
        match resource.link()? {
            Link::External(url) => {
                let url = sanitize_url(url)?;
                Some(format!(
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">Open resource</a>"#,
                    escape_html(url)
                ))
            }
            Link::File(name) => match self.file_links {
                FileLinks::Served => Some(format!(
                    r#"<a href="{}" download>Download file</a>"#,
                    escape_html(&upload_path(name))
                )),
                FileLinks::Unsupported => Some(format!(
                    r#"<p class="note">{}</p>"#,
                    escape_html(&self.download_unavailable)
                )),
            },
        }
    }
}

/// Path of a stored upload, with the file name percent-encoded.
#[must_use]
pub fn upload_path(file_name: &str) -> String {
    format!("{UPLOADS_ROUTE}/{}", urlencoding::encode(file_name))
}
