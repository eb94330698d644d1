use crate::models::{FieldErrors, Goal, RoadmapForm, RoadmapParams};
use async_trait::async_trait;

use super::export::{self, ExportFile};
use super::gateway::{ApiGateway, GatewayError};

pub const FALLBACK_MESSAGE: &str = "Failed to generate roadmap. Please try again.";

/// Anything that can turn validated parameters into roadmap text.
#[async_trait]
pub trait RoadmapGenerator {
    async fn generate(&self, params: &RoadmapParams) -> Result<String, GatewayError>;
}

#[async_trait]
impl RoadmapGenerator for ApiGateway {
    async fn generate(&self, params: &RoadmapParams) -> Result<String, GatewayError> {
        self.generate_roadmap(params).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight,
    Succeeded(String),
    Failed,
}

#[derive(Debug, Default)]
pub struct RoadmapFlow {
    pub form: RoadmapForm,
    field_errors: FieldErrors,
    state: RequestState,
    submitted: Option<RoadmapParams>,
}

impl RoadmapFlow {
    pub fn new(form: RoadmapForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn is_loading(&self) -> bool {
        self.state == RequestState::InFlight
    }

    /// Validates the form and, when it is complete, issues exactly one
    /// generation request. Returns whether a request was sent.
    pub async fn submit<G>(&mut self, generator: &G) -> bool
    where
        G: RoadmapGenerator + Sync + ?Sized,
    {
        if self.is_loading() {
            return false;
        }

        let params = match self.form.validate() {
            Ok(params) => params,
            Err(errors) => {
                self.field_errors = errors;
                return false;
            }
        };

        self.field_errors = FieldErrors::default();
        self.submitted = Some(params);
        self.state = RequestState::InFlight;

        self.state = match generator.generate(&params).await {
            Ok(roadmap) => RequestState::Succeeded(roadmap),
            Err(e) => {
                log::warn!("Roadmap generation failed: {}", e);
                RequestState::Failed
            }
        };
        true
    }

    /// Text shown in place of the form once a request has finished.
    pub fn displayed_roadmap(&self) -> Option<&str> {
        match &self.state {
            RequestState::Succeeded(roadmap) => Some(roadmap),
            RequestState::Failed => Some(FALLBACK_MESSAGE),
            RequestState::Idle | RequestState::InFlight => None,
        }
    }

    fn goal(&self) -> Option<Goal> {
        self.submitted.map(|params| params.goal)
    }

    pub fn markdown_export(&self) -> Option<ExportFile> {
        Some(export::markdown_file(self.goal()?, self.displayed_roadmap()?))
    }

    pub fn print_export(&self) -> Option<String> {
        Some(export::print_html(self.goal()?, self.displayed_roadmap()?))
    }

    pub fn clipboard_export(&self) -> Option<String> {
        self.displayed_roadmap().map(export::clipboard_text)
    }

    /// Back to an empty form view.
    pub fn reset(&mut self) {
        self.state = RequestState::Idle;
        self.field_errors = FieldErrors::default();
        self.submitted = None;
    }
}
