use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::{DEFAULT_NAMESPACE, SecureVault, VaultError, VaultKey};

/// Vault persisted as a JSON map in a file only the current user can read.
///
/// Used by the command-line client, where no platform keychain is assumed.
/// The whole file is rewritten on every change.
#[derive(Debug)]
pub struct FileVault {
    path: PathBuf,
    namespace: String,
    lock: Mutex<()>,
}

impl FileVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_namespace(path, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, VaultError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), VaultError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %self.path.display(), entries = entries.len(), "Vault file written");
        Ok(())
    }
}

impl SecureVault for FileVault {
    fn read(&self, key: VaultKey) -> Result<Option<String>, VaultError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(&key.storage_key(&self.namespace)))
    }

    fn contains(&self, key: VaultKey) -> Result<bool, VaultError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.contains_key(&key.storage_key(&self.namespace)))
    }

    fn write(&self, key: VaultKey, value: &str) -> Result<(), VaultError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.storage_key(&self.namespace), value.to_string());
        self.store(&entries)
    }

    fn delete(&self, key: VaultKey) -> Result<(), VaultError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        if entries.remove(&key.storage_key(&self.namespace)).is_none() {
            return Ok(());
        }
        self.store(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vault.json");

        let vault = FileVault::new(&path);
        vault.write(VaultKey::AccessToken, "access").unwrap();
        vault.write(VaultKey::RefreshToken, "refresh").unwrap();

        let reopened = FileVault::new(&path);
        assert_eq!(reopened.read(VaultKey::AccessToken).unwrap().as_deref(), Some("access"));
        assert_eq!(reopened.read(VaultKey::RefreshToken).unwrap().as_deref(), Some("refresh"));
        assert_eq!(reopened.read(VaultKey::BiometricAccessToken).unwrap(), None);
        assert!(reopened.contains(VaultKey::RefreshToken).unwrap());
        assert!(!reopened.contains(VaultKey::BiometricAccessToken).unwrap());
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.json");

        let a = FileVault::with_namespace(&path, "a");
        let b = FileVault::with_namespace(&path, "b");
        a.write(VaultKey::AccessToken, "one").unwrap();
        assert_eq!(b.read(VaultKey::AccessToken).unwrap(), None);

        a.delete(VaultKey::AccessToken).unwrap();
        assert_eq!(a.read(VaultKey::AccessToken).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.json");
        fs::write(&path, "not json").unwrap();

        let vault = FileVault::new(&path);
        assert!(matches!(vault.read(VaultKey::AccessToken), Err(VaultError::Corrupt(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.json");
        FileVault::new(&path).write(VaultKey::AccessToken, "x").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
