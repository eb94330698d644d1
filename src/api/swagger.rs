use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PrepWise API",
        version = "1.0.0",
        description = "Backend for PrepWise, a study planner for competitive exams (UPSC, JEE, NEET, GATE, CA).\n\n**Authentication:** every endpoint except login, signup and Google OAuth requires a JWT bearer token."
    ),
    paths(
        // Auth
        crate::api::auth::signup,
        crate::api::auth::login,
        crate::api::auth::google_auth,
        crate::api::auth::google_callback,
        crate::api::auth::google_callback_json,
        crate::api::auth::verify,

        // Dashboard
        crate::api::dashboard::get_dashboard,
        crate::api::dashboard::recent_activities,

        // Roadmap
        crate::api::roadmap::get_roadmap,
        crate::api::roadmap::create_item,
        crate::api::roadmap::update_item,
        crate::api::roadmap::generate_roadmap,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::LoginRequest,
            crate::models::RegisterRequest,
            crate::models::GoogleCodeRequest,
            crate::models::AuthResponse,
            crate::models::AuthData,
            crate::models::UserInfo,
            crate::models::ErrorResponse,
            crate::api::auth::VerifyResponse,

            crate::models::DashboardData,
            crate::models::UserStats,
            crate::models::RecentActivity,
            crate::models::ActivityType,

            crate::models::RoadmapCategory,
            crate::models::RoadmapItem,
            crate::models::CreateRoadmapItemRequest,
            crate::models::UpdateRoadmapItemRequest,
            crate::models::RoadmapForm,
            crate::models::Goal,
            crate::models::LearningSpeed,
            crate::models::LearningLevel,
            crate::api::roadmap::GenerateRoadmapResponse,
            crate::api::roadmap::GeneratedRoadmap,

            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Email/password and Google authentication."),
        (name = "Dashboard", description = "Progress stats and recent activity."),
        (name = "Roadmap", description = "Stored roadmap items and AI roadmap generation."),
        (name = "Health", description = "Health check and counters for monitoring."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/login or /api/signup"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_protected_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/api/roadmap/generate"));
        assert!(paths.contains_key("/api/roadmap/items/{id}"));
        assert!(paths.contains_key("/api/auth/verify"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
