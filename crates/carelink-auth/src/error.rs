//! Session and authentication error types.

use carelink_core::ApiError;

use crate::biometric::BiometricError;
use crate::vault::VaultError;

/// Errors raised by session operations that are not plain request failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The operation needs a signed-in session and there is none.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// No biometric-protected credential has been stored on this device.
    #[error("Biometric login is not set up")]
    BiometricUnavailable,

    /// The user dismissed or failed the biometric prompt.
    #[error("Biometric confirmation was denied")]
    BiometricDenied,

    /// The biometric prompt itself could not be shown.
    #[error(transparent)]
    Biometric(#[from] BiometricError),

    /// Sign-in failed. Deliberately does not say whether the credential or
    /// the network was at fault.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Whether the user should be sent back to the password sign-in screen.
    #[must_use]
    pub fn requires_password_login(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::BiometricUnavailable | Self::AuthenticationFailed
        ) || matches!(self, Self::Api(ApiError::Unauthorized { .. }))
    }
}

/// Type alias for session operation results.
pub type AuthResult<T> = Result<T, AuthError>;
