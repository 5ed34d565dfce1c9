use crate::core::identity::{AnonymousId, IdentityError, IdentityProvider};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keeps the anonymous identity in a small file so it survives restarts.
///
/// The identity is read (or generated and written) on the first call and
/// cached for the life of the provider. If the file cannot be read or written
/// the provider logs a warning and keeps using its in-memory identity; a
/// later process will then get a different one.
pub struct FileIdentityProvider {
    path: PathBuf,
    cached: Mutex<Option<AnonymousId>>,
}

impl FileIdentityProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cached: Mutex::new(None),
        }
    }

    fn load(&self) -> Result<Option<AnonymousId>, IdentityError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text =
            fs::read_to_string(&self.path).map_err(|e| IdentityError::StorageError(e.to_string()))?;
        match AnonymousId::parse(&text) {
            Ok(id) => Ok(Some(id)),
            // An empty or mangled file is replaced with a fresh identity.
            Err(_) => Ok(None),
        }
    }

    fn save(&self, id: &AnonymousId) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| IdentityError::StorageError(e.to_string()))?;
        }
        fs::write(&self.path, id.as_str()).map_err(|e| IdentityError::StorageError(e.to_string()))
    }

    fn load_or_create(&self) -> AnonymousId {
        match self.load() {
            Ok(Some(id)) => return id,
            Ok(None) => {}
            Err(err) => {
                // The file exists but is unreadable; leave it for a later run.
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Could not read identity file; using a session-only identity"
                );
                return AnonymousId::generate();
            }
        }

        let id = AnonymousId::generate();
        if let Err(err) = self.save(&id) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Could not persist identity; likes from this client are de-duplicated for this session only"
            );
        }
        id
    }
}

impl IdentityProvider for FileIdentityProvider {
    fn get_or_create_identity(&self) -> AnonymousId {
        let mut cached = match self.cached.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cached.get_or_insert_with(|| self.load_or_create()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_then_reuses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("identity");

        let first = FileIdentityProvider::new(&path).get_or_create_identity();
        assert!(path.exists());

        // A new provider (new process) reads the same identity back.
        let second = FileIdentityProvider::new(&path).get_or_create_identity();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stable_within_one_provider() {
        let dir = TempDir::new().unwrap();
        let provider = FileIdentityProvider::new(dir.path().join("identity"));
        assert_eq!(
            provider.get_or_create_identity(),
            provider.get_or_create_identity()
        );
    }

    #[test]
    fn test_blank_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity");
        fs::write(&path, "   \n").unwrap();

        let id = FileIdentityProvider::new(&path).get_or_create_identity();
        assert_eq!(fs::read_to_string(&path).unwrap(), id.as_str());
    }

    #[test]
    fn test_unreadable_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity");
        // Writable, but not valid UTF-8, so reading it fails.
        let original = [0xff, 0xfe, 0x00, 0x41];
        fs::write(&path, original).unwrap();

        let provider = FileIdentityProvider::new(&path);
        let id = provider.get_or_create_identity();
        assert_eq!(id, provider.get_or_create_identity());

        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_unwritable_location_still_yields_identity() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is needed makes the write fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let provider = FileIdentityProvider::new(blocker.join("identity"));

        let first = provider.get_or_create_identity();
        assert_eq!(first, provider.get_or_create_identity());
    }
}
