//! Client session: bearer token plus the signed-in user, kept in a
//! [`KeyValueStore`] under the `token` and `user` keys.

use crate::models::{AuthResponse, UserInfo};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use reqwest::Url;
use thiserror::Error;

use super::storage::{KeyValueStore, StorageError};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid redirect URL: {0}")]
    InvalidRedirect(String),
    #[error("failed to encode user: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Auth,
    Dashboard,
    Roadmap,
    Generate,
}

impl View {
    pub fn is_protected(self) -> bool {
        self != View::Auth
    }
}

/// Outcome of the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Render(View),
    Redirect(View),
}

/// Expiry (`exp`, seconds since epoch) of a JWT, read without verifying the
/// signature. `None` for anything that is not a JWT carrying `exp`.
pub fn token_expiry(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

pub struct Session<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Wraps `store` and drops a persisted token that has already expired.
    pub fn load(store: S) -> SessionResult<Self> {
        let mut session = Self::new(store);
        if session.is_authenticated()? {
            log::debug!("Restored session from storage");
        }
        Ok(session)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn token(&self) -> SessionResult<Option<String>> {
        Ok(self.store.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// A session is present when a token is stored. Tokens that are JWTs are
    /// also checked for expiry; an expired one is cleared.
    pub fn is_authenticated(&mut self) -> SessionResult<bool> {
        let Some(token) = self.token()? else {
            return Ok(false);
        };

        match token_expiry(&token) {
            Some(exp) if exp <= Utc::now().timestamp() => {
                log::info!("Stored token expired, clearing session");
                self.logout()?;
                Ok(false)
            }
            _ => Ok(true),
        }
    }

    /// The stored user, or `None`. Unparseable user data is removed.
    pub fn current_user(&mut self) -> SessionResult<Option<UserInfo>> {
        let Some(raw) = self.store.get(USER_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                log::warn!("Discarding unreadable user data: {}", e);
                self.store.remove(USER_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn establish(&mut self, token: &str, user: &UserInfo) -> SessionResult<()> {
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(USER_KEY, &serde_json::to_string(user)?)?;
        Ok(())
    }

    pub fn establish_from_response(&mut self, response: &AuthResponse) -> SessionResult<()> {
        self.establish(&response.token, &response.data.user)
    }

    /// Handles the OAuth landing URL. When it carries both `token` and `user`
    /// they are persisted as-is. Returns the URL without its query string, and
    /// whether a session was established.
    pub fn complete_oauth_redirect(&mut self, url: &str) -> SessionResult<(String, bool)> {
        let mut parsed =
            Url::parse(url).map_err(|e| SessionError::InvalidRedirect(e.to_string()))?;

        let mut token = None;
        let mut user = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                TOKEN_KEY => token = Some(value.into_owned()),
                USER_KEY => user = Some(value.into_owned()),
                _ => {}
            }
        }

        let established = match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                self.store.set(TOKEN_KEY, &token)?;
                self.store.set(USER_KEY, &user)?;
                true
            }
            _ => false,
        };

        parsed.set_query(None);
        Ok((parsed.to_string(), established))
    }

    pub fn logout(&mut self) -> SessionResult<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(())
    }

    /// Protected views render only with a session; otherwise the caller is
    /// sent to the auth view.
    pub fn guard(&mut self, view: View) -> SessionResult<Access> {
        if !view.is_protected() || self.is_authenticated()? {
            Ok(Access::Render(view))
        } else {
            Ok(Access::Redirect(View::Auth))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStore;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    fn user() -> UserInfo {
        UserInfo {
            id: "65f0a1".to_string(),
            email: "riya@prepwise.in".to_string(),
            name: Some("Riya".to_string()),
            picture: None,
        }
    }

    #[test]
    fn test_guard_redirects_without_session() {
        let mut session = Session::new(MemoryStore::new());

        assert_eq!(session.guard(View::Dashboard).unwrap(), Access::Redirect(View::Auth));
        assert_eq!(session.guard(View::Auth).unwrap(), Access::Render(View::Auth));
    }

    #[test]
    fn test_guard_renders_with_session() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, "opaque-token").unwrap();
        let mut session = Session::load(store).unwrap();

        assert_eq!(session.guard(View::Roadmap).unwrap(), Access::Render(View::Roadmap));
    }

    #[test]
    fn test_login_response_is_persisted() {
        let response = AuthResponse::success("t1".to_string(), user());
        let mut session = Session::new(MemoryStore::new());
        session.establish_from_response(&response).unwrap();

        assert_eq!(session.store().get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        let stored: UserInfo =
            serde_json::from_str(&session.store().get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, response.data.user);
    }

    #[test]
    fn test_invalid_user_json_is_cleared() {
        let mut store = MemoryStore::new();
        store.set(USER_KEY, "{not json").unwrap();
        let mut session = Session::new(store);

        assert_eq!(session.current_user().unwrap(), None);
        assert_eq!(session.store().get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_expired_jwt_counts_as_no_session() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, &jwt_with_exp(Utc::now().timestamp() - 60)).unwrap();
        store.set(USER_KEY, &serde_json::to_string(&user()).unwrap()).unwrap();
        let mut session = Session::load(store).unwrap();

        assert!(!session.is_authenticated().unwrap());
        assert_eq!(session.store().get(TOKEN_KEY).unwrap(), None);
        assert_eq!(session.store().get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_live_jwt_counts_as_session() {
        let mut store = MemoryStore::new();
        store.set(TOKEN_KEY, &jwt_with_exp(Utc::now().timestamp() + 3600)).unwrap();
        let mut session = Session::new(store);

        assert!(session.is_authenticated().unwrap());
    }

    #[test]
    fn test_token_expiry_ignores_opaque_tokens() {
        assert_eq!(token_expiry("t1"), None);
        assert_eq!(token_expiry("a.b.c.d"), None);
        assert_eq!(token_expiry(&jwt_with_exp(42)), Some(42));
    }

    #[test]
    fn test_oauth_redirect_persists_and_cleans_url() {
        let user_json = serde_json::to_string(&user()).unwrap();
        let url = format!(
            "http://localhost:5173/auth?token=abc&user={}",
            urlencoding::encode(&user_json)
        );
        let mut session = Session::new(MemoryStore::new());

        let (clean, established) = session.complete_oauth_redirect(&url).unwrap();

        assert!(established);
        assert_eq!(clean, "http://localhost:5173/auth");
        assert_eq!(session.token().unwrap().as_deref(), Some("abc"));
        assert_eq!(session.current_user().unwrap(), Some(user()));
    }

    #[test]
    fn test_oauth_redirect_without_params_changes_nothing() {
        let mut session = Session::new(MemoryStore::new());
        let (clean, established) = session
            .complete_oauth_redirect("http://localhost:5173/auth?error=denied")
            .unwrap();

        assert!(!established);
        assert_eq!(clean, "http://localhost:5173/auth");
        assert_eq!(session.token().unwrap(), None);
    }

    #[test]
    fn test_logout_clears_both_keys() {
        let mut session = Session::new(MemoryStore::new());
        session.establish("t1", &user()).unwrap();
        session.logout().unwrap();

        assert_eq!(session.token().unwrap(), None);
        assert_eq!(session.current_user().unwrap(), None);
    }
}
