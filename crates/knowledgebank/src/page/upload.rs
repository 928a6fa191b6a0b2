//! Upload page (backend-API deployments only).

use tracing::{info, warn};

use crate::config::UiConfig;
use crate::render::{Container, Node};
use crate::source::{ApiSource, UploadForm};

use super::{ids, Markup};

/// Controller for the upload form.
#[derive(Debug)]
pub struct UploadPage {
    api: ApiSource,
    form: UploadForm,
    message: Container,
    success_text: String,
    failure_text: String,
}

impl UploadPage {
    /// Element ids the page needs.
    pub const REQUIRED_IDS: [&'static str; 2] = [ids::UPLOAD_FORM, ids::UPLOAD_MESSAGE];

    /// Mount the controller, or return `None` if the markup lacks a required element.
    #[must_use]
    pub fn mount(markup: &Markup, api: ApiSource, ui: &UiConfig) -> Option<Self> {
        if !markup.provides("upload", &Self::REQUIRED_IDS) {
            return None;
        }
        Some(Self {
            api,
            form: UploadForm::default(),
            message: Container::new(ids::UPLOAD_MESSAGE),
            success_text: ui.upload_success.clone(),
            failure_text: ui.upload_failure.clone(),
        })
    }

    /// The form being edited.
    #[must_use]
    pub fn form(&self) -> &UploadForm {
        &self.form
    }

    /// Mutable access to the form fields.
    pub fn form_mut(&mut self) -> &mut UploadForm {
        &mut self.form
    }

    /// The status message container.
    #[must_use]
    pub fn message(&self) -> &Container {
        &self.message
    }

    /// Submit the form. Returns whether the upload succeeded.
    ///
    /// On success the form is reset; on failure it is kept so the user can
    /// retry.
    pub async fn submit(&mut self) -> bool {
        match self.api.upload(self.form.clone()).await {
            Ok(resource) => {
                info!(title = %resource.title, "Resource uploaded");
                self.form = UploadForm::default();
                self.message
                    .show_message(Node::success(self.success_text.clone()));
                true
            }
            Err(e) => {
                warn!(error = %e, "Upload failed");
                self.message
                    .show_message(Node::error(self.failure_text.clone()));
                false
            }
        }
    }
}
