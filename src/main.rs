use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use prepwise::{
    api::{self, swagger::ApiDoc},
    config::AppConfig,
    database::MongoDB,
    middleware::{SecurityHeaders, UserDirectory},
    services::CompletionClient,
};
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    log::info!("🚀 Starting PrepWise service...");

    let db = MongoDB::new(&config.mongodb_uri).await.map_err(|e| {
        log::error!("❌ Failed to connect to MongoDB: {}", e);
        io::Error::new(io::ErrorKind::ConnectionRefused, e)
    })?;
    log::info!("✅ MongoDB connected successfully");

    let completion = CompletionClient::new(config.completion.clone());
    if completion.is_configured() {
        log::info!("🤖 Roadmap generation enabled (model: {})", completion.model());
    } else {
        log::warn!("⚠️  GROQ_API_KEY not set, roadmap generation will answer 503");
    }
    if config.google.is_none() {
        log::warn!("⚠️  Google OAuth credentials not set, Google login is disabled");
    }

    let bind_addr = (config.host.clone(), config.port);
    log::info!("🌐 Server starting on {}:{}", bind_addr.0, bind_addr.1);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", bind_addr.0, bind_addr.1);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", bind_addr.0, bind_addr.1);

    let db_data = web::Data::new(db);
    let users: web::Data<dyn UserDirectory> =
        web::Data::from(db_data.clone().into_inner() as Arc<dyn UserDirectory>);
    let config_data = web::Data::new(config);
    let completion_data = web::Data::new(completion);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config_data.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
            ])
            .expose_headers(vec![header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(db_data.clone())
            .app_data(users.clone())
            .app_data(config_data.clone())
            .app_data(completion_data.clone())
            .wrap(cors)
            .wrap(SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .configure(api::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
