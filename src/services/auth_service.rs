use crate::{
    config::{AppConfig, GoogleOAuthSettings, JwtSettings},
    database::{MongoDB, USERS},
    models::{AuthResponse, LoginRequest, RegisterRequest, User, UserInfo},
    utils::{AppError, AppResult},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use lazy_static::lazy_static;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::error::{ErrorKind as DbErrorKind, WriteFailure};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

lazy_static! {
    static ref HTTP: reqwest::Client = reqwest::Client::new();
}

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // user id (ObjectId hex)
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

/// Profile returned by Google's userinfo endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct GoogleProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

pub fn generate_jwt(settings: &JwtSettings, user: &User) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.user_id(),
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(settings.expires_in)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn verify_token(settings: &JwtSettings, token: &str) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired".to_string()),
        _ => AppError::Unauthorized("Invalid token".to_string()),
    })
}

async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

async fn check_password(password: String, hashed: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify(password, &hashed))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))
}

pub async fn find_user(db: &MongoDB, user_id: &str) -> AppResult<Option<User>> {
    let Ok(id) = ObjectId::parse_str(user_id) else {
        return Ok(None);
    };
    Ok(db.collection::<User>(USERS).find_one(doc! { "_id": id }).await?)
}

const DUPLICATE_KEY: i32 = 11000;

/// True when `err` is a unique index violation.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        DbErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Inserts a new account. The unique email index settles signups that race
/// past the lookup in [`register`].
async fn insert_user(db: &MongoDB, user: &User) -> AppResult<()> {
    match db.collection::<User>(USERS).insert_one(user).await {
        Ok(_) => Ok(()),
        Err(e) if is_duplicate_key(&e) => {
            log::warn!("⚠️  Concurrent signup for {} lost the race", user.email);
            Err(AppError::Validation("Email already in use".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

// User registration
pub async fn register(
    db: &MongoDB,
    jwt: &JwtSettings,
    request: &RegisterRequest,
) -> AppResult<AuthResponse> {
    validation::validate_register(request)?;

    let collection = db.collection::<User>(USERS);
    let email = request.email.trim().to_string();

    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(AppError::Validation("Email already in use".to_string()));
    }

    let mut user = User::new(email);
    user.password = Some(hash_password(request.password.clone()).await?);

    insert_user(db, &user).await?;

    log::info!("✅ User registered successfully: {}", user.email);

    let token = generate_jwt(jwt, &user)?;
    Ok(AuthResponse::success(
        token,
        UserInfo {
            id: user.user_id(),
            email: user.email,
            name: None,
            picture: None,
        },
    ))
}

// User login
pub async fn login(db: &MongoDB, jwt: &JwtSettings, request: &LoginRequest) -> AppResult<AuthResponse> {
    validation::validate_login(request)?;

    let invalid = || AppError::Unauthorized("Incorrect email or password".to_string());

    let user = db
        .collection::<User>(USERS)
        .find_one(doc! { "email": request.email.trim() })
        .await?
        .ok_or_else(invalid)?;

    // OAuth-only accounts have no password to compare against
    let stored = user.password.clone().ok_or_else(invalid)?;
    if !check_password(request.password.clone(), stored).await? {
        return Err(invalid());
    }

    let token = generate_jwt(jwt, &user)?;
    Ok(AuthResponse::success(token, UserInfo::from(&user)))
}

pub fn google_authorize_url(google: &GoogleOAuthSettings) -> String {
    let params = [
        ("client_id", google.client_id.as_str()),
        ("redirect_uri", google.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", "email profile"),
        ("access_type", "offline"),
        ("prompt", "consent"),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", GOOGLE_AUTH_URL, query_string)
}

async fn fetch_google_profile(google: &GoogleOAuthSettings, code: &str) -> AppResult<GoogleProfile> {
    let token_response = HTTP
        .post(GOOGLE_TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", &google.client_id),
            ("client_secret", &google.client_secret),
            ("redirect_uri", &google.redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Google authentication failed: {}", e)))?;

    if !token_response.status().is_success() {
        return Err(AppError::Validation(
            "Failed to get access token from Google".to_string(),
        ));
    }

    let tokens: serde_json::Value = token_response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Google authentication failed: {}", e)))?;

    let access_token = tokens["access_token"]
        .as_str()
        .ok_or_else(|| AppError::Validation("Failed to get access token from Google".to_string()))?;

    let user_info_response = HTTP
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Google authentication failed: {}", e)))?;

    if !user_info_response.status().is_success() {
        return Err(AppError::Validation(
            "Failed to get user info from Google".to_string(),
        ));
    }

    user_info_response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Google authentication failed: {}", e)))
}

/// Finds the user by Google id, then by email (linking the Google id), else creates one.
pub async fn upsert_google_user(db: &MongoDB, profile: GoogleProfile) -> AppResult<User> {
    let email = profile
        .email
        .clone()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email not provided by Google".to_string()))?;

    let collection = db.collection::<User>(USERS);

    if let Some(mut existing) = collection
        .find_one(doc! { "google_id": &profile.id })
        .await?
    {
        if existing.name != profile.name || existing.picture != profile.picture {
            collection
                .update_one(
                    doc! { "_id": existing.id },
                    doc! { "$set": { "name": profile.name.clone(), "picture": profile.picture.clone() } },
                )
                .await?;
            existing.name = profile.name;
            existing.picture = profile.picture;
        }
        return Ok(existing);
    }

    if let Some(mut existing) = collection.find_one(doc! { "email": &email }).await? {
        log::info!("🔗 Linking Google account to existing user: {}", existing.user_id());
        collection
            .update_one(
                doc! { "_id": existing.id },
                doc! { "$set": {
                    "google_id": &profile.id,
                    "name": profile.name.clone(),
                    "picture": profile.picture.clone(),
                } },
            )
            .await?;
        existing.google_id = Some(profile.id);
        existing.name = profile.name;
        existing.picture = profile.picture;
        return Ok(existing);
    }

    let mut user = User::new(email);
    user.google_id = Some(profile.id);
    user.name = profile.name;
    user.picture = profile.picture;
    collection.insert_one(&user).await?;

    log::info!("✅ Created user from Google profile: {}", user.user_id());
    Ok(user)
}

pub async fn handle_google_callback(
    db: &MongoDB,
    config: &AppConfig,
    code: &str,
) -> AppResult<AuthResponse> {
    let google = config
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google login is not configured".to_string()))?;

    let profile = fetch_google_profile(google, code).await?;
    let user = upsert_google_user(db, profile).await?;
    let token = generate_jwt(&config.jwt, &user)?;

    Ok(AuthResponse::success(token, UserInfo::from(&user)))
}

/// Frontend URL carrying the session in `token` and `user` (JSON) query parameters.
pub fn oauth_redirect_url(frontend_url: &str, response: &AuthResponse) -> AppResult<String> {
    let user_json = serde_json::to_string(&response.data.user)
        .map_err(|e| AppError::Internal(format!("Failed to encode user: {}", e)))?;

    Ok(format!(
        "{}/auth?token={}&user={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(&response.token),
        urlencoding::encode(&user_json)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret".to_string(),
            expires_in: 3600,
        }
    }

    #[test]
    fn test_jwt_round_trip_carries_user() {
        let user = User::new("meera@prepwise.in".to_string());
        let token = generate_jwt(&settings(), &user).unwrap();

        let claims = verify_token(&settings(), &token).unwrap();
        assert_eq!(claims.sub, user.user_id());
        assert_eq!(claims.email, "meera@prepwise.in");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let expired = JwtSettings {
            expires_in: -120,
            ..settings()
        };
        let token = generate_jwt(&expired, &User::new("a@b.co".to_string())).unwrap();

        let err = verify_token(&settings(), &token).unwrap_err();
        assert_eq!(err.to_string(), "Token has expired");
    }

    #[test]
    fn test_foreign_signature_is_invalid() {
        let other = JwtSettings {
            secret: "someone-else".to_string(),
            ..settings()
        };
        let token = generate_jwt(&other, &User::new("a@b.co".to_string())).unwrap();

        let err = verify_token(&settings(), &token).unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
        assert!(verify_token(&settings(), "garbage").is_err());
    }

    #[test]
    fn test_google_authorize_url() {
        let google = GoogleOAuthSettings {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "http://localhost:5000/api/auth/google/callback".to_string(),
        };
        let url = google_authorize_url(&google);

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("scope=email%20profile"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fapi%2Fauth%2Fgoogle%2Fcallback"));
        assert!(!url.contains("shh"));
    }

    #[test]
    fn test_oauth_redirect_url_encodes_user_json() {
        let response = AuthResponse::success(
            "tok".to_string(),
            UserInfo {
                id: "u1".to_string(),
                email: "a@b.co".to_string(),
                name: Some("Asha K".to_string()),
                picture: None,
            },
        );
        let url = oauth_redirect_url("http://localhost:5173/", &response).unwrap();

        assert!(url.starts_with("http://localhost:5173/auth?token=tok&user="));
        let encoded = url.split("&user=").nth(1).unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let user: UserInfo = serde_json::from_str(&decoded).unwrap();
        assert_eq!(user.name.as_deref(), Some("Asha K"));
    }

    #[tokio::test]
    async fn test_password_hash_check() {
        let hashed = hash_password("secret1".to_string()).await.unwrap();
        assert!(check_password("secret1".to_string(), hashed.clone()).await.unwrap());
        assert!(!check_password("secret2".to_string(), hashed).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_duplicate_insert_is_reported_as_email_in_use() {
        dotenv::dotenv().ok();
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017/prepwise_test".to_string());
        let db = MongoDB::new(&uri).await.unwrap();
        let email = format!("{}@prepwise.in", ObjectId::new().to_hex());

        insert_user(&db, &User::new(email.clone())).await.unwrap();
        let err = insert_user(&db, &User::new(email)).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Email already in use");
    }
}
