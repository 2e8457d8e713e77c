use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use super::{DEFAULT_NAMESPACE, SecureVault, VaultError, VaultKey};

/// Process-local vault. Nothing survives a restart.
///
/// Writes can be made to fail on demand, which is how a locked platform
/// keychain behaves.
#[derive(Debug)]
pub struct MemoryVault {
    namespace: String,
    entries: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: RwLock::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureVault for MemoryVault {
    fn read(&self, key: VaultKey) -> Result<Option<String>, VaultError> {
        Ok(self
            .entries
            .read()
            .get(&key.storage_key(&self.namespace))
            .cloned())
    }

    fn contains(&self, key: VaultKey) -> Result<bool, VaultError> {
        Ok(self
            .entries
            .read()
            .contains_key(&key.storage_key(&self.namespace)))
    }

    fn write(&self, key: VaultKey, value: &str) -> Result<(), VaultError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(VaultError::Unavailable("vault is locked".to_string()));
        }
        self.entries
            .write()
            .insert(key.storage_key(&self.namespace), value.to_string());
        Ok(())
    }

    fn delete(&self, key: VaultKey) -> Result<(), VaultError> {
        self.entries.write().remove(&key.storage_key(&self.namespace));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_delete() {
        let vault = MemoryVault::new();
        assert_eq!(vault.read(VaultKey::AccessToken).unwrap(), None);

        vault.write(VaultKey::AccessToken, "abc").unwrap();
        assert_eq!(vault.read(VaultKey::AccessToken).unwrap().as_deref(), Some("abc"));
        assert_eq!(vault.read(VaultKey::RefreshToken).unwrap(), None);

        assert!(vault.contains(VaultKey::AccessToken).unwrap());
        assert!(!vault.contains(VaultKey::RefreshToken).unwrap());

        vault.delete(VaultKey::AccessToken).unwrap();
        vault.delete(VaultKey::AccessToken).unwrap();
        assert!(!vault.contains(VaultKey::AccessToken).unwrap());
        assert!(vault.is_empty());
    }

    #[test]
    fn test_failing_writes() {
        let vault = MemoryVault::new();
        vault.set_fail_writes(true);
        assert!(matches!(
            vault.write(VaultKey::RefreshToken, "r"),
            Err(VaultError::Unavailable(_))
        ));
        assert!(vault.is_empty());
    }
}
