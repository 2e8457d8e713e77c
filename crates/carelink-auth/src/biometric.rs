//! Biometric confirmation seam.
//!
//! A gate asks the device owner to prove presence (face, fingerprint or an
//! equivalent local check) before the biometric-protected token copy is
//! read. The session manager never sees how the check is performed.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BiometricError {
    #[error("Biometric authentication is not available on this device")]
    Unavailable,

    #[error("Biometric prompt failed: {0}")]
    Prompt(String),
}

#[async_trait]
pub trait BiometricGate: Send + Sync {
    /// Ask the user to confirm. `Ok(false)` means the user declined or the
    /// check did not match.
    async fn confirm(&self, reason: &str) -> Result<bool, BiometricError>;
}

/// Gate with a fixed answer. Useful for headless runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticGate {
    allow: bool,
}

impl StaticGate {
    pub fn allow() -> Self {
        Self { allow: true }
    }

    pub fn deny() -> Self {
        Self { allow: false }
    }
}

#[async_trait]
impl BiometricGate for StaticGate {
    async fn confirm(&self, _reason: &str) -> Result<bool, BiometricError> {
        Ok(self.allow)
    }
}

/// Gate for devices without any biometric hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBiometrics;

#[async_trait]
impl BiometricGate for NoBiometrics {
    async fn confirm(&self, _reason: &str) -> Result<bool, BiometricError> {
        Err(BiometricError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_gates() {
        assert!(StaticGate::allow().confirm("sign in").await.unwrap());
        assert!(!StaticGate::deny().confirm("sign in").await.unwrap());
        assert_eq!(
            NoBiometrics.confirm("sign in").await,
            Err(BiometricError::Unavailable)
        );
    }
}
