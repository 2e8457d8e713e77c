//! Sign-in, sign-out and profile endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use carelink_auth::{AuthResult, SessionManager, SessionProbe};
use carelink_core::models::Provider;
use carelink_core::{ApiError, ApiResult, Method};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::executor::RequestExecutor;

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const ME_PATH: &str = "/auth/me";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: Provider,
}

pub struct AuthService {
    executor: Arc<RequestExecutor>,
}

impl AuthService {
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    fn session(&self) -> &Arc<SessionManager> {
        self.executor.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.session().subscribe()
    }

    /// Pick up the session saved by a previous run, if any.
    pub fn restore_session(&self) -> bool {
        self.session().restore_from_vault()
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Provider> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::invalid_request("Email and password are required"));
        }

        let data: LoginData = self
            .executor
            .send_json(Method::Post, LOGIN_PATH, &LoginRequest { email, password }, false)
            .await?;
        self.session().set_session(data.access_token, data.refresh_token);
        info!(provider_id = %data.user.id, "Signed in");
        Ok(data.user)
    }

    pub async fn current_user(&self) -> ApiResult<Provider> {
        self.executor.get(ME_PATH).await
    }

    /// Sign out locally, telling the backend when possible.
    ///
    /// The local session and the biometric copy are always erased, even when
    /// the backend cannot be reached.
    pub async fn logout(&self) {
        if self.is_authenticated()
            && let Err(e) = self.executor.execute_unit(Method::Post, LOGOUT_PATH, true).await
        {
            debug!(error = %e, "Backend logout failed, clearing locally");
        }
        if let Err(e) = self.session().disable_biometric_login() {
            warn!(error = %e, "Failed to erase biometric token");
        }
        self.session().clear_session();
    }

    pub fn has_biometric_login(&self) -> bool {
        self.session().has_biometric_login()
    }

    pub fn enable_biometrics(&self) -> AuthResult<()> {
        self.session().enable_biometric_login()
    }

    pub fn disable_biometrics(&self) -> AuthResult<()> {
        self.session().disable_biometric_login()
    }

    pub async fn login_with_biometrics(&self) -> AuthResult<()> {
        self.session().login_with_biometrics(self).await
    }
}

#[async_trait]
impl SessionProbe for AuthService {
    async fn verify(&self) -> Result<(), ApiError> {
        self.current_user().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, session_with};
    use carelink_auth::AuthError;
    use carelink_core::{ApiErrorKind, TransportError};
    use serde_json::json;

    fn service(transport: &Arc<MockTransport>) -> AuthService {
        let executor = RequestExecutor::new(transport.clone(), session_with(transport.clone()));
        AuthService::new(Arc::new(executor))
    }

    fn provider() -> serde_json::Value {
        json!({
            "id": "u-1",
            "email": "dr@clinic.example",
            "firstName": "Ana",
            "lastName": "Reyes"
        })
    }

    #[tokio::test]
    async fn test_login_establishes_session() {
        let transport = MockTransport::new();
        let auth = service(&transport);
        transport.push_json(
            200,
            json!({
                "success": true,
                "data": { "token": "a-1", "refreshToken": "r-1", "user": provider() }
            }),
        );

        let user = auth.login(" dr@clinic.example ", "secret").await.unwrap();

        assert_eq!(user.id, "u-1");
        assert!(auth.is_authenticated());
        assert_eq!(auth.session().refresh_token().as_deref(), Some("r-1"));
        let request = &transport.requests()[0];
        assert_eq!(request.header("Authorization"), None);
        let body: serde_json::Value = serde_json::from_slice(request.body.bytes()).unwrap();
        assert_eq!(body["email"], "dr@clinic.example");
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let transport = MockTransport::new();
        let auth = service(&transport);

        let err = auth.login("", "secret").await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::InvalidRequest);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_offline() {
        let transport = MockTransport::new();
        let auth = service(&transport);
        auth.session().set_session("a", None);
        auth.enable_biometrics().unwrap();
        transport.push_error(TransportError::Timeout);

        auth.logout().await;

        assert!(!auth.is_authenticated());
        assert!(!auth.has_biometric_login());
    }

    #[tokio::test]
    async fn test_biometric_login_probes_profile() {
        let transport = MockTransport::new();
        let auth = service(&transport);
        auth.session().set_session("bio-token", None);
        auth.enable_biometrics().unwrap();
        auth.session().clear_session();
        transport.push_json(200, json!({ "success": true, "data": provider() }));

        auth.login_with_biometrics().await.unwrap();

        assert!(auth.is_authenticated());
        let requests = transport.requests();
        assert_eq!(requests[0].path, ME_PATH);
        assert_eq!(requests[0].header("Authorization"), Some("Bearer bio-token"));
    }

    #[tokio::test]
    async fn test_biometric_login_failure_is_generic() {
        let transport = MockTransport::new();
        let auth = service(&transport);
        auth.session().set_session("bio-token", None);
        auth.enable_biometrics().unwrap();
        auth.session().clear_session();
        transport.push_error(TransportError::Connect("refused".into()));

        let err = auth.login_with_biometrics().await.unwrap_err();

        assert!(matches!(err, AuthError::AuthenticationFailed));
        assert!(!auth.is_authenticated());
        assert!(!auth.has_biometric_login());
    }
}
