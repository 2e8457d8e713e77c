//! Session lifecycle.
//!
//! [`SessionManager`] owns the current access/refresh token pair. The
//! in-memory copy is authoritative; the vault is a best-effort mirror used to
//! restore the session on the next launch. Observers learn about sign-in and
//! sign-out through a `watch` channel carrying the authenticated flag.

use std::sync::Arc;

use async_trait::async_trait;
use carelink_core::{ApiError, Envelope, HttpRequest, Method, RequestBody, Transport};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::biometric::BiometricGate;
use crate::error::{AuthError, AuthResult};
use crate::vault::{SecureVault, VaultKey};

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

const BIOMETRIC_REASON: &str = "Sign in to CareLink";

/// Snapshot of the token pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Endpoint exchanging a refresh token for a new access token.
    pub refresh_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
        }
    }
}

/// A cheap authenticated call used to confirm a restored token still works.
#[async_trait]
pub trait SessionProbe: Send + Sync {
    async fn verify(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenGrant {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct SessionManager {
    vault: Arc<dyn SecureVault>,
    transport: Arc<dyn Transport>,
    gate: Arc<dyn BiometricGate>,
    config: SessionConfig,
    state: RwLock<Session>,
    authenticated: watch::Sender<bool>,
    refresh_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        vault: Arc<dyn SecureVault>,
        transport: Arc<dyn Transport>,
        gate: Arc<dyn BiometricGate>,
        config: SessionConfig,
    ) -> Self {
        let (authenticated, _) = watch::channel(false);
        Self {
            vault,
            transport,
            gate,
            config,
            state: RwLock::new(Session::default()),
            authenticated,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    /// Receiver that yields the authenticated flag whenever it flips.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    /// Install a new token pair and mirror it into the vault.
    ///
    /// A vault that refuses the write only costs persistence across
    /// restarts; the in-memory session is still established.
    pub fn set_session(&self, access_token: impl Into<String>, refresh_token: Option<String>) {
        let session = Session {
            access_token: Some(access_token.into()),
            refresh_token,
        };
        let mut state = self.state.write();
        *state = session;
        self.mirror(&state);
        drop(state);

        self.publish(true);
        debug!("Session established");
    }

    /// Drop both tokens from memory and the vault.
    ///
    /// Idempotent. Returns `true` only when a session was actually ended.
    pub fn clear_session(&self) -> bool {
        let mut state = self.state.write();
        let was_authenticated = state.is_authenticated();
        *state = Session::default();
        for key in [VaultKey::AccessToken, VaultKey::RefreshToken] {
            if let Err(e) = self.vault.delete(key) {
                warn!(slot = key.as_str(), error = %e, "Failed to erase vault slot");
            }
        }
        drop(state);

        self.publish(false);
        if was_authenticated {
            info!("Session cleared");
        }
        was_authenticated
    }

    /// Reload the token pair persisted by a previous run.
    ///
    /// The session is considered authenticated as soon as an access token is
    /// found; callers confirm it with a lightweight request.
    pub fn restore_from_vault(&self) -> bool {
        let access = self.read_slot(VaultKey::AccessToken);
        let refresh = self.read_slot(VaultKey::RefreshToken);

        let Some(access) = access else {
            debug!("No persisted session");
            return false;
        };

        *self.state.write() = Session {
            access_token: Some(access),
            refresh_token: refresh,
        };
        self.publish(true);
        info!("Session restored from vault");
        true
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `false` without touching the session when there is no refresh
    /// token or the exchange fails for any reason.
    pub async fn refresh(&self) -> bool {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refresh after a request made with `stale_access_token` was rejected.
    ///
    /// When another caller already replaced that token while this one was
    /// waiting, the new token is reused instead of refreshing twice.
    pub async fn refresh_after(&self, stale_access_token: Option<&str>) -> bool {
        let _guard = self.refresh_lock.lock().await;
        {
            let state = self.state.read();
            if let Some(current) = state.access_token.as_deref()
                && Some(current) != stale_access_token
            {
                debug!("Access token already refreshed by another request");
                return true;
            }
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> bool {
        let Some(refresh_token) = self.refresh_token() else {
            debug!("No refresh token, skipping refresh");
            return false;
        };

        let body = serde_json::json!({ "refreshToken": refresh_token });
        let body = match serde_json::to_vec(&body) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode refresh request");
                return false;
            }
        };
        let request = HttpRequest::new(Method::Post, self.config.refresh_path.as_str())
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json")
            .with_body(RequestBody::Json(body));

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return false;
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "Token refresh rejected");
            return false;
        }

        let decoded = Envelope::<TokenGrant>::decode(&response.body).and_then(Envelope::into_data);
        let grant = match decoded {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "Token refresh response unreadable");
                return false;
            }
        };

        // The session may have been cleared while the exchange was in flight.
        let mut state = self.state.write();
        if state.refresh_token.as_deref() != Some(refresh_token.as_str()) {
            debug!("Session changed during refresh, discarding new token");
            return false;
        }
        *state = Session {
            access_token: Some(grant.access_token),
            refresh_token: grant.refresh_token.or(Some(refresh_token)),
        };
        self.mirror(&state);
        drop(state);

        self.publish(true);
        info!("Access token refreshed");
        true
    }

    /// Whether a biometric token copy is enrolled. Only checks presence; the
    /// copy itself is never read here.
    pub fn has_biometric_login(&self) -> bool {
        match self.vault.contains(VaultKey::BiometricAccessToken) {
            Ok(present) => present,
            Err(e) => {
                warn!(error = %e, "Failed to check biometric enrollment");
                false
            }
        }
    }

    /// Store a biometric-protected copy of the current access token.
    pub fn enable_biometric_login(&self) -> AuthResult<()> {
        let token = self.access_token().ok_or(AuthError::NotAuthenticated)?;
        self.vault.write(VaultKey::BiometricAccessToken, &token)?;
        info!("Biometric login enabled");
        Ok(())
    }

    pub fn disable_biometric_login(&self) -> AuthResult<()> {
        self.vault.delete(VaultKey::BiometricAccessToken)?;
        info!("Biometric login disabled");
        Ok(())
    }

    /// Sign in with the biometric-protected token copy.
    ///
    /// Enrollment is checked by presence only; the copy is read after the gate
    /// confirms. It is then checked with
    /// `probe`; if the check fails for any reason the copy is erased, the
    /// session is cleared and a generic failure is returned.
    pub async fn login_with_biometrics(&self, probe: &dyn SessionProbe) -> AuthResult<()> {
        if !self.has_biometric_login() {
            return Err(AuthError::BiometricUnavailable);
        }

        if !self.gate.confirm(BIOMETRIC_REASON).await? {
            debug!("Biometric confirmation declined");
            return Err(AuthError::BiometricDenied);
        }

        let token = self
            .vault
            .read(VaultKey::BiometricAccessToken)?
            .ok_or(AuthError::BiometricUnavailable)?;
        let refresh = self.refresh_token();
        self.set_session(token, refresh);

        if let Err(e) = probe.verify().await {
            warn!(error = %e, "Biometric session could not be verified");
            if let Err(e) = self.vault.delete(VaultKey::BiometricAccessToken) {
                warn!(error = %e, "Failed to erase biometric token");
            }
            self.clear_session();
            return Err(AuthError::AuthenticationFailed);
        }

        info!("Signed in with biometrics");
        Ok(())
    }

    fn mirror(&self, session: &Session) {
        let slots = [
            (VaultKey::AccessToken, session.access_token.as_deref()),
            (VaultKey::RefreshToken, session.refresh_token.as_deref()),
        ];
        for (key, value) in slots {
            let result = match value {
                Some(value) => self.vault.write(key, value),
                None => self.vault.delete(key),
            };
            if let Err(e) = result {
                warn!(slot = key.as_str(), error = %e, "Failed to persist session to vault");
            }
        }
    }

    fn read_slot(&self, key: VaultKey) -> Option<String> {
        match self.vault.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(slot = key.as_str(), error = %e, "Failed to read vault slot");
                None
            }
        }
    }

    fn publish(&self, authenticated: bool) {
        self.authenticated.send_if_modified(|current| {
            let changed = *current != authenticated;
            *current = authenticated;
            changed
        });
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .field("refresh_path", &self.config.refresh_path)
            .finish_non_exhaustive()
    }
}
