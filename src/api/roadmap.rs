use crate::{
    database::MongoDB,
    models::{
        CreateRoadmapItemRequest, ErrorResponse, RoadmapCategory, RoadmapForm, RoadmapItem,
        UpdateRoadmapItemRequest,
    },
    services::{auth_service::Claims, generation_service, roadmap_service, CompletionClient},
    utils::AppResult,
};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::metrics;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeneratedRoadmap {
    /// Markdown text as returned by the model.
    pub roadmap: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerateRoadmapResponse {
    pub status: String,
    pub data: GeneratedRoadmap,
}

#[utoipa::path(
    get,
    path = "/api/roadmap",
    tag = "Roadmap",
    responses(
        (status = 200, description = "Categories with their items", body = [RoadmapCategory]),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_roadmap(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    let roadmap = roadmap_service::get_roadmap(&db, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(roadmap))
}

#[utoipa::path(
    post,
    path = "/api/roadmap/items",
    tag = "Roadmap",
    request_body = CreateRoadmapItemRequest,
    responses(
        (status = 201, description = "Item created", body = RoadmapItem),
        (status = 400, description = "Title or category missing", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_item(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    request: web::Json<CreateRoadmapItemRequest>,
) -> AppResult<HttpResponse> {
    let item = roadmap_service::create_item(&db, &claims.sub, &request).await?;
    Ok(HttpResponse::Created().json(item))
}

#[utoipa::path(
    patch,
    path = "/api/roadmap/items/{id}",
    tag = "Roadmap",
    params(
        ("id" = String, Path, description = "Roadmap item id")
    ),
    request_body = UpdateRoadmapItemRequest,
    responses(
        (status = 200, description = "Updated item", body = RoadmapItem),
        (status = 400, description = "No fields to update", body = ErrorResponse),
        (status = 404, description = "Roadmap item not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_item(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdateRoadmapItemRequest>,
) -> AppResult<HttpResponse> {
    let item_id = path.into_inner();
    log::info!("✏️  PATCH /api/roadmap/items/{} - user: {}", item_id, claims.sub);

    let item = roadmap_service::update_item(&db, &claims.sub, &item_id, &request).await?;
    Ok(HttpResponse::Ok().json(item))
}

#[utoipa::path(
    post,
    path = "/api/roadmap/generate",
    tag = "Roadmap",
    request_body = RoadmapForm,
    responses(
        (status = 200, description = "Generated roadmap", body = GenerateRoadmapResponse),
        (status = 400, description = "Per-field validation errors", body = ErrorResponse),
        (status = 502, description = "Completion service failed", body = ErrorResponse),
        (status = 503, description = "Completion service not configured", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_roadmap(
    completion: web::Data<CompletionClient>,
    claims: web::ReqData<Claims>,
    form: web::Json<RoadmapForm>,
) -> AppResult<HttpResponse> {
    let params = match form.validate() {
        Ok(params) => params,
        Err(errors) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "status": "error",
                "message": errors.to_string(),
                "errors": errors,
            })));
        }
    };

    log::info!(
        "🗺️  POST /api/roadmap/generate - user: {}, goal: {}",
        claims.sub,
        params.goal
    );

    match generation_service::generate(&completion, &params).await {
        Ok(roadmap) => {
            metrics::increment_roadmaps_generated();
            Ok(HttpResponse::Ok().json(GenerateRoadmapResponse {
                status: "success".to_string(),
                data: GeneratedRoadmap { roadmap },
            }))
        }
        Err(e) => {
            metrics::increment_generation_failures();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, CompletionSettings};
    use crate::middleware::auth::known_users;
    use crate::models::User;
    use crate::services::auth_service;
    use mongodb::bson::oid::ObjectId;
    use actix_web::{http::StatusCode, test, App};

    fn completion_for(server: &mockito::ServerGuard) -> CompletionClient {
        CompletionClient::new(CompletionSettings {
            api_url: format!("{}/chat/completions", server.url()),
            api_key: Some("gsk_test".to_string()),
            ..CompletionSettings::default()
        })
    }

    const KAVYA_ID: &str = "65f0000000000000000000b2";

    fn bearer() -> String {
        let user = User {
            id: ObjectId::parse_str(KAVYA_ID).unwrap(),
            ..User::new("kavya@prepwise.in".to_string())
        };
        let token = auth_service::generate_jwt(&test_config().jwt, &user).unwrap();
        format!("Bearer {}", token)
    }

    fn form() -> serde_json::Value {
        serde_json::json!({
            "endGoal": "NEET",
            "learningSpeed": "Medium learner",
            "learningLevel": "Beginner",
            "startDate": "2026-01-01",
            "endDate": "2026-05-01"
        })
    }

    macro_rules! app_with {
        ($completion:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_config()))
                    .app_data(web::Data::new($completion))
                    .app_data(known_users(&[KAVYA_ID]))
                    .configure(crate::api::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_generate_returns_model_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r##"{"choices":[{"message":{"content":"# Plan\n- Day 1: Cell biology"}}]}"##)
            .create_async()
            .await;
        let app = app_with!(completion_for(&server));

        let req = test::TestRequest::post()
            .uri("/api/roadmap/generate")
            .insert_header(("Authorization", bearer()))
            .set_json(form())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: GenerateRoadmapResponse = test::read_body_json(resp).await;
        assert_eq!(body.status, "success");
        assert_eq!(body.data.roadmap, "# Plan\n- Day 1: Cell biology");
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .create_async()
            .await;
        let app = app_with!(completion_for(&server));

        let req = test::TestRequest::post()
            .uri("/api/roadmap/generate")
            .insert_header(("Authorization", bearer()))
            .set_json(form())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
    }

    #[actix_web::test]
    async fn test_invalid_form_lists_field_errors() {
        let app = app_with!(CompletionClient::new(CompletionSettings::default()));

        let req = test::TestRequest::post()
            .uri("/api/roadmap/generate")
            .insert_header(("Authorization", bearer()))
            .set_json(serde_json::json!({
                "endGoal": "GATE",
                "startDate": "2026-06-01",
                "endDate": "2026-03-01"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["errors"]["dateRange"], "End date must be after start date");
        assert_eq!(body["errors"]["learningSpeed"], "Please select your learning speed");
        assert!(body["errors"].get("endGoal").is_none());
    }

    #[actix_web::test]
    async fn test_generate_requires_token() {
        let app = app_with!(CompletionClient::new(CompletionSettings::default()));

        let req = test::TestRequest::post()
            .uri("/api/roadmap/generate")
            .set_json(form())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_malformed_json_is_bad_request() {
        let app = app_with!(CompletionClient::new(CompletionSettings::default()));

        let req = test::TestRequest::post()
            .uri("/api/roadmap/generate")
            .insert_header(("Authorization", bearer()))
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
    }
}
