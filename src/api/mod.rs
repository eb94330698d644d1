pub mod auth;
pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod roadmap;
pub mod swagger;

use crate::{middleware::AuthMiddleware, utils::AppError};
use actix_web::web;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid JSON body: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid query: {}", err)).into())
}

/// Registers every route of the service. Shared state (`MongoDB`, `AppConfig`,
/// `CompletionClient`) is expected as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/", web::get().to(health::root))
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(metrics::get_metrics))
        .service(
            web::scope("/api")
                .route("/login", web::post().to(auth::login))
                .route("/signup", web::post().to(auth::signup))
                .route("/auth/google", web::get().to(auth::google_auth))
                .service(
                    web::resource("/auth/google/callback")
                        .route(web::get().to(auth::google_callback))
                        .route(web::post().to(auth::google_callback_json)),
                )
                // Protected endpoints requiring JWT authentication
                .service(
                    web::resource("/auth/verify")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(auth::verify)),
                )
                .service(
                    web::resource("/dashboard")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(dashboard::get_dashboard)),
                )
                .service(
                    web::resource("/activities/recent")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(dashboard::recent_activities)),
                )
                .service(
                    web::resource("/roadmap")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(roadmap::get_roadmap)),
                )
                .service(
                    web::resource("/roadmap/items")
                        .wrap(AuthMiddleware)
                        .route(web::post().to(roadmap::create_item)),
                )
                .service(
                    web::resource("/roadmap/items/{id}")
                        .wrap(AuthMiddleware)
                        .route(web::patch().to(roadmap::update_item)),
                )
                .service(
                    web::resource("/roadmap/generate")
                        .wrap(AuthMiddleware)
                        .route(web::post().to(roadmap::generate_roadmap)),
                ),
        );
}
