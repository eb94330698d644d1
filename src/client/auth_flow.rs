use crate::models::{LoginRequest, RegisterRequest};

use super::gateway::ApiGateway;
use super::session::{Session, SessionResult};
use super::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Login / registration form state.
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    error: Option<String>,
    loading: bool,
}

impl AuthForm {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn register(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            mode: AuthMode::Register,
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
            ..Self::default()
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn validate(&self) -> Result<(), &'static str> {
        let confirm_missing =
            self.mode == AuthMode::Register && self.confirm_password.is_empty();
        if self.email.trim().is_empty() || self.password.is_empty() || confirm_missing {
            return Err("Please fill in all fields");
        }
        if self.mode == AuthMode::Register && self.password != self.confirm_password {
            return Err("Passwords do not match");
        }
        Ok(())
    }

    /// Sends the form and establishes the session on success. Returns whether
    /// the user is now signed in; on failure the message is in [`Self::error`].
    pub async fn submit<S: KeyValueStore>(
        &mut self,
        gateway: &ApiGateway,
        session: &mut Session<S>,
    ) -> SessionResult<bool> {
        self.error = None;
        if let Err(message) = self.validate() {
            self.error = Some(message.to_string());
            return Ok(false);
        }

        self.loading = true;
        let result = match self.mode {
            AuthMode::Login => {
                gateway
                    .login(&LoginRequest {
                        email: self.email.trim().to_string(),
                        password: self.password.clone(),
                    })
                    .await
            }
            AuthMode::Register => {
                gateway
                    .signup(&RegisterRequest {
                        email: self.email.trim().to_string(),
                        password: self.password.clone(),
                        confirm_password: self.confirm_password.clone(),
                    })
                    .await
            }
        };
        self.loading = false;

        match result {
            Ok(response) => {
                session.establish_from_response(&response)?;
                log::info!("Signed in as {}", response.data.user.email);
                Ok(true)
            }
            Err(e) => {
                log::debug!("Authentication failed: {}", e);
                self.error = Some(e.user_message());
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::{TOKEN_KEY, USER_KEY};
    use crate::client::storage::MemoryStore;
    use crate::models::UserInfo;

    #[tokio::test]
    async fn test_successful_login_persists_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success","token":"t1","data":{"user":{"id":"42","email":"neha@prepwise.in","name":"Neha"}}}"#)
            .create_async()
            .await;
        let gateway = ApiGateway::new(format!("{}/api", server.url()));
        let mut session = Session::new(MemoryStore::new());

        let mut form = AuthForm::login("neha@prepwise.in", "hunter22");
        assert!(form.submit(&gateway, &mut session).await.unwrap());

        assert_eq!(session.store().get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        let user: UserInfo =
            serde_json::from_str(&session.store().get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            user,
            UserInfo {
                id: "42".to_string(),
                email: "neha@prepwise.in".to_string(),
                name: Some("Neha".to_string()),
                picture: None,
            }
        );
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn test_password_mismatch_blocks_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/api/signup").expect(0).create_async().await;
        let gateway = ApiGateway::new(format!("{}/api", server.url()));
        let mut session = Session::new(MemoryStore::new());

        let mut form = AuthForm::register("a@b.in", "secret1", "secret2");
        assert!(!form.submit(&gateway, &mut session).await.unwrap());

        assert_eq!(form.error(), Some("Passwords do not match"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_rejection_shows_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/signup")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"error","message":"Email already in use"}"#)
            .create_async()
            .await;
        let gateway = ApiGateway::new(format!("{}/api", server.url()));
        let mut session = Session::new(MemoryStore::new());

        let mut form = AuthForm::register("a@b.in", "secret1", "secret1");
        assert!(!form.submit(&gateway, &mut session).await.unwrap());

        assert_eq!(form.error(), Some("Email already in use"));
        assert_eq!(session.token().unwrap(), None);
    }

    #[test]
    fn test_toggle_clears_error() {
        let mut form = AuthForm::default();
        form.error = Some("Passwords do not match".to_string());
        form.toggle_mode();

        assert_eq!(form.mode, AuthMode::Register);
        assert_eq!(form.error(), None);
    }
}
