use crate::{
    config::AppConfig,
    database::MongoDB,
    models::{AuthData, AuthResponse, GoogleCodeRequest, LoginRequest, RegisterRequest, UserInfo},
    services::auth_service::{self, Claims},
    utils::{AppError, AppResult},
};
use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::metrics;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct GoogleCallbackQuery {
    /// Authorization code issued by Google.
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VerifyResponse {
    pub status: String,
    pub data: AuthData,
}

fn require_code(code: Option<&str>) -> AppResult<&str> {
    code.map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Authorization code not provided".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/signup",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid data or email already in use")
    )
)]
pub async fn signup(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    request: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    log::info!("📝 POST /api/signup - email: {}", request.email);

    let response = auth_service::register(&db, &config.jwt, &request).await?;
    metrics::increment_signups();
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Incorrect email or password")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    log::info!("🔐 POST /api/login - email: {}", request.email);

    match auth_service::login(&db, &config.jwt, &request).await {
        Ok(response) => {
            metrics::increment_logins();
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/google",
    tag = "Auth",
    responses(
        (status = 302, description = "Redirect to Google's consent screen"),
        (status = 503, description = "Google login is not configured")
    )
)]
pub async fn google_auth(config: web::Data<AppConfig>) -> AppResult<HttpResponse> {
    let google = config
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google login is not configured".to_string()))?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, auth_service::google_authorize_url(google)))
        .finish())
}

#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    tag = "Auth",
    params(GoogleCallbackQuery),
    responses(
        (status = 302, description = "Redirect to the frontend carrying token and user"),
        (status = 400, description = "Authorization code not provided")
    )
)]
pub async fn google_callback(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    query: web::Query<GoogleCallbackQuery>,
) -> AppResult<HttpResponse> {
    let code = require_code(query.code.as_deref())?;
    log::info!("🔑 GET /api/auth/google/callback");

    let response = auth_service::handle_google_callback(&db, &config, code).await?;
    let location = auth_service::oauth_redirect_url(&config.frontend_url, &response)?;
    metrics::increment_logins();

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish())
}

#[utoipa::path(
    post,
    path = "/api/auth/google/callback",
    tag = "Auth",
    request_body = GoogleCodeRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Authorization code not provided")
    )
)]
pub async fn google_callback_json(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    request: web::Json<GoogleCodeRequest>,
) -> AppResult<HttpResponse> {
    let code = require_code(Some(&request.code))?;
    log::info!("🔑 POST /api/auth/google/callback");

    let response = auth_service::handle_google_callback(&db, &config, code).await?;
    metrics::increment_logins();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    let user = auth_service::find_user(&db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(VerifyResponse {
        status: "success".to_string(),
        data: AuthData {
            user: UserInfo::from(&user),
        },
    }))
}
