//! Thin HTTP wrapper over the PrepWise REST API. One request per call, no
//! retries; errors are returned to the caller untouched.

use crate::api::{auth::VerifyResponse, roadmap::GenerateRoadmapResponse};
use crate::models::{
    AuthResponse, CreateRoadmapItemRequest, DashboardData, ErrorResponse, GoogleCodeRequest,
    LoginRequest, RecentActivity, RegisterRequest, RoadmapCategory, RoadmapForm, RoadmapItem,
    RoadmapParams, UpdateRoadmapItemRequest, UserInfo,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },
    /// No response arrived.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Message suitable for showing next to a form.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            GatewayError::Status { message: None, .. } | GatewayError::Decode(_) => {
                "An error occurred".to_string()
            }
            GatewayError::Transport(_) => "Network error occurred".to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone)]
pub struct ApiGateway {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser entry point of the Google sign-in flow.
    pub fn google_login_url(&self) -> String {
        format!("{}/auth/google", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> GatewayResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.message);
            log::debug!("API answered {} ({:?})", status, message);
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    pub async fn login(&self, request: &LoginRequest) -> GatewayResult<AuthResponse> {
        self.send(self.request(Method::POST, "/login").json(request))
            .await
    }

    pub async fn signup(&self, request: &RegisterRequest) -> GatewayResult<AuthResponse> {
        self.send(self.request(Method::POST, "/signup").json(request))
            .await
    }

    pub async fn google_callback(&self, code: &str) -> GatewayResult<AuthResponse> {
        let body = GoogleCodeRequest {
            code: code.to_string(),
        };
        self.send(self.request(Method::POST, "/auth/google/callback").json(&body))
            .await
    }

    pub async fn verify(&self) -> GatewayResult<UserInfo> {
        let response: VerifyResponse = self.send(self.request(Method::GET, "/auth/verify")).await?;
        Ok(response.data.user)
    }

    pub async fn dashboard(&self) -> GatewayResult<DashboardData> {
        self.send(self.request(Method::GET, "/dashboard")).await
    }

    pub async fn recent_activities(&self, limit: Option<u32>) -> GatewayResult<Vec<RecentActivity>> {
        let mut builder = self.request(Method::GET, "/activities/recent");
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        self.send(builder).await
    }

    pub async fn roadmap(&self) -> GatewayResult<Vec<RoadmapCategory>> {
        self.send(self.request(Method::GET, "/roadmap")).await
    }

    pub async fn create_roadmap_item(
        &self,
        request: &CreateRoadmapItemRequest,
    ) -> GatewayResult<RoadmapItem> {
        self.send(self.request(Method::POST, "/roadmap/items").json(request))
            .await
    }

    pub async fn update_roadmap_item(
        &self,
        item_id: &str,
        patch: &UpdateRoadmapItemRequest,
    ) -> GatewayResult<RoadmapItem> {
        let path = format!("/roadmap/items/{}", urlencoding::encode(item_id));
        self.send(self.request(Method::PATCH, &path).json(patch))
            .await
    }

    pub async fn mark_item_completed(&self, item_id: &str) -> GatewayResult<RoadmapItem> {
        self.update_roadmap_item(item_id, &UpdateRoadmapItemRequest::completed(true))
            .await
    }

    pub async fn generate_roadmap(&self, params: &RoadmapParams) -> GatewayResult<String> {
        let form = RoadmapForm::from(*params);
        let response: GenerateRoadmapResponse = self
            .send(self.request(Method::POST, "/roadmap/generate").json(&form))
            .await?;
        Ok(response.data.roadmap)
    }
}
