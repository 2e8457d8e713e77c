//! # carelink-auth
//!
//! Holds the signed-in provider's credentials for the CareLink client.
//!
//! - [`session::SessionManager`] - access/refresh token pair, refresh and
//!   biometric re-authentication
//! - [`vault`] - the [`SecureVault`] seam plus memory and file vaults
//! - [`biometric`] - the [`BiometricGate`] confirmation seam

pub mod biometric;
pub mod error;
pub mod session;
pub mod vault;

pub use biometric::{BiometricError, BiometricGate, NoBiometrics, StaticGate};
pub use error::{AuthError, AuthResult};
pub use session::{Session, SessionConfig, SessionManager, SessionProbe};
pub use vault::{FileVault, MemoryVault, SecureVault, VaultError, VaultKey};
