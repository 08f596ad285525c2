use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::TempDir;

use crate::model::repo_spec::RepoSpec;

use super::GitError;

const TMP_ENTRY_PREFIX: &str = ".tmp-";

/// The shared directory holding one checkout per cache key.
///
/// No locking is performed: two processes cloning the same key race on
/// the final rename, and the loser reports an error.
#[derive(Debug, Clone)]
pub struct RepoCache {
    location: PathBuf,
}

impl RepoCache {
    pub fn new(location: impl Into<PathBuf>) -> RepoCache {
        RepoCache {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Creates the cache location if it does not exist yet.
    pub fn ensure_location(&self) -> Result<(), GitError> {
        if self.location.exists() {
            if !self.location.is_dir() {
                return Err(GitError::BadCacheLocation {
                    location: self.location.to_string_lossy().to_string(),
                });
            }
        } else {
            debug!("Creating cache location {}", self.location.display());
            std::fs::create_dir_all(&self.location)?;
        }
        Ok(())
    }

    /// Where the checkout for `spec` lives, whether or not it exists yet.
    pub fn entry_path(&self, spec: &RepoSpec) -> PathBuf {
        self.location.join(spec.cache_key())
    }

    /// A scratch directory on the same filesystem as the entries, so that
    /// renaming it onto an entry is atomic. Removed when dropped.
    pub(crate) fn scratch_dir(&self) -> Result<TempDir, GitError> {
        tempfile::Builder::new()
            .prefix(TMP_ENTRY_PREFIX)
            .tempdir_in(&self.location)
            .map_err(GitError::TempDir)
    }

    pub fn clear(&self) -> Result<(), GitError> {
        if self.location.exists() {
            info!("Clearing repository cache {}.", self.location.display());
            std::fs::remove_dir_all(&self.location)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn entry_path_uses_cache_key() {
        let cache = RepoCache::new("cache-root");
        let spec = RepoSpec::new("github.com", "example/repo", "");
        assert_eq!(
            cache.entry_path(&spec),
            PathBuf::from("cache-root").join("github.com_example_repo_master")
        );
    }

    #[test]
    fn ensure_location_creates_missing_directories() {
        let temp = tempfile::tempdir().unwrap();
        let cache = RepoCache::new(temp.path().join("a").join("b"));

        cache.ensure_location().unwrap();
        assert!(cache.location().is_dir());
        // Idempotent.
        cache.ensure_location().unwrap();
    }

    #[test]
    fn ensure_location_rejects_files() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "").unwrap();

        let err = RepoCache::new(&file).ensure_location().unwrap_err();
        assert!(matches!(err, GitError::BadCacheLocation { .. }));
    }

    #[test]
    fn scratch_dir_lives_inside_the_cache() {
        let temp = tempfile::tempdir().unwrap();
        let cache = RepoCache::new(temp.path());

        let scratch = cache.scratch_dir().unwrap();
        assert_eq!(scratch.path().parent(), Some(temp.path()));
        let path = scratch.path().to_path_buf();
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn clear_removes_everything() {
        let temp = tempfile::tempdir().unwrap();
        let cache = RepoCache::new(temp.path().join("cache"));
        cache.ensure_location().unwrap();
        std::fs::create_dir(cache.location().join("entry")).unwrap();

        cache.clear().unwrap();
        assert!(!cache.location().exists());
        // Clearing a missing cache is fine.
        cache.clear().unwrap();
    }
}
