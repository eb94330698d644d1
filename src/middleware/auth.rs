use crate::{
    config::AppConfig,
    database::MongoDB,
    services::auth_service::{self, Claims},
    utils::{AppError, AppResult},
};
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage, ResponseError,
};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Answers whether a token's subject still has an account. Registered as
/// `web::Data<dyn UserDirectory>`; the middleware refuses to run without one.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: &str) -> AppResult<bool>;
}

#[async_trait]
impl UserDirectory for MongoDB {
    async fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        Ok(auth_service::find_user(self, user_id).await?.is_some())
    }
}

/// Rejects requests without a valid bearer token. On success the decoded
/// [`Claims`] are available to handlers as `web::ReqData<Claims>`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let token = bearer_token(req)
        .ok_or_else(|| AppError::Unauthorized("Authorization token is missing".to_string()))?;

    let config = req
        .app_data::<web::Data<AppConfig>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("AppConfig is not registered".to_string()))?;

    let users = req
        .app_data::<web::Data<dyn UserDirectory>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("UserDirectory is not registered".to_string()))?;

    let claims = auth_service::verify_token(&config.jwt, &token)?;

    if !users.user_exists(&claims.sub).await? {
        return Err(AppError::Unauthorized("User no longer exists".to_string()));
    }

    Ok(claims)
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match authenticate(&req).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(e) => {
                    log::warn!("🔒 Rejected request to {}: {}", req.path(), e);
                    let response = e.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Fixed set of account ids, for wiring protected routes without a database.
#[cfg(test)]
pub(crate) struct KnownUsers(pub Vec<String>);

#[cfg(test)]
#[async_trait]
impl UserDirectory for KnownUsers {
    async fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.0.iter().any(|id| id == user_id))
    }
}

#[cfg(test)]
pub(crate) fn known_users(ids: &[&str]) -> web::Data<dyn UserDirectory> {
    let users: std::sync::Arc<dyn UserDirectory> =
        std::sync::Arc::new(KnownUsers(ids.iter().map(|id| id.to_string()).collect()));
    web::Data::from(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::models::User;
    use actix_web::{body::MessageBody, http::StatusCode, test, App, HttpResponse};
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use mongodb::bson::oid::ObjectId;

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.sub.clone())
    }

    const ARJUN_ID: &str = "65f0000000000000000000a1";

    fn arjun() -> User {
        User {
            id: ObjectId::parse_str(ARJUN_ID).unwrap(),
            ..User::new("arjun@prepwise.in".to_string())
        }
    }

    macro_rules! protected_app {
        () => {
            protected_app!(known_users(&[ARJUN_ID]))
        };
        ($users:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_config()))
                    .app_data($users)
                    .service(
                        web::scope("/api")
                            .wrap(AuthMiddleware)
                            .route("/me", web::get().to(whoami)),
                    ),
            )
            .await
        };
    }

    async fn error_message<B: MessageBody>(resp: ServiceResponse<B>) -> String {
        let body: serde_json::Value = test::read_body_json(resp).await;
        body["message"].as_str().unwrap_or_default().to_string()
    }

    #[actix_web::test]
    async fn test_missing_token_is_rejected() {
        let app = protected_app!();
        let req = test::TestRequest::get().uri("/api/me").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(resp).await, "Authorization token is missing");
    }

    #[actix_web::test]
    async fn test_valid_token_exposes_claims() {
        let app = protected_app!();
        let user = arjun();
        let token = auth_service::generate_jwt(&test_config().jwt, &user).unwrap();

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, user.user_id().as_bytes());
    }

    #[actix_web::test]
    async fn test_expired_token_is_rejected() {
        let app = protected_app!();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "65f000000000000000000001".to_string(),
            email: "old@prepwise.in".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            jti: "stale".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(test_config().jwt.secret.as_bytes()),
        )
        .unwrap();

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(resp).await, "Token has expired");
    }

    #[actix_web::test]
    async fn test_non_bearer_scheme_is_treated_as_missing() {
        let app = protected_app!();
        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(resp).await, "Authorization token is missing");
    }

    #[actix_web::test]
    async fn test_deleted_user_is_rejected() {
        let app = protected_app!(known_users(&[]));
        let token = auth_service::generate_jwt(&test_config().jwt, &arjun()).unwrap();

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(resp).await, "User no longer exists");
    }

    #[actix_web::test]
    async fn test_missing_user_directory_fails_closed() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .route("/me", web::get().to(whoami)),
                ),
        )
        .await;
        let token = auth_service::generate_jwt(&test_config().jwt, &arjun()).unwrap();

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
