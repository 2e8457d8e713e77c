//! Secure key/value storage for session secrets.
//!
//! The vault is opaque to the session manager: it only reads, writes and
//! deletes string secrets in three well-known slots. Platform keychains are
//! plugged in by implementing [`SecureVault`]; this crate ships a process
//! local [`MemoryVault`] and a per-user [`FileVault`].

mod file;
mod memory;

pub use file::FileVault;
pub use memory::MemoryVault;

/// Default namespace all slots are keyed under.
pub const DEFAULT_NAMESPACE: &str = "com.carelink.session";

/// The slots the session manager uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultKey {
    AccessToken,
    RefreshToken,
    /// Copy of the access token that may only be read after a biometric
    /// confirmation.
    BiometricAccessToken,
}

impl VaultKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::BiometricAccessToken => "biometric_access_token",
        }
    }

    /// Fully qualified storage key within `namespace`.
    pub fn storage_key(&self, namespace: &str) -> String {
        format!("{namespace}.{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Vault I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vault contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Vault is unavailable: {0}")]
    Unavailable(String),
}

/// Opaque secret store.
///
/// Implementations must be safe to call from any thread. Calls are short and
/// synchronous; the session manager never holds them across an await point.
pub trait SecureVault: Send + Sync {
    fn read(&self, key: VaultKey) -> Result<Option<String>, VaultError>;

    /// Whether a slot holds a value. Must not hand out or unlock the secret,
    /// so it is safe to call before any user confirmation.
    fn contains(&self, key: VaultKey) -> Result<bool, VaultError>;

    fn write(&self, key: VaultKey, value: &str) -> Result<(), VaultError>;

    /// Remove a slot. Deleting an empty slot is not an error.
    fn delete(&self, key: VaultKey) -> Result<(), VaultError>;
}
