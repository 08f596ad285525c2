use std::{
    fmt::{Display, Formatter},
    io,
    path::{Path, PathBuf},
};

const TMP_DIR_PREFIX: &str = "repoclone-";

/// An absolute path to a directory that was confirmed to exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfirmedDir(PathBuf);

impl ConfirmedDir {
    /// Canonicalizes `path` and checks that it is a directory.
    pub fn new(path: impl AsRef<Path>) -> io::Result<ConfirmedDir> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", path.display()),
            ));
        }
        Ok(ConfirmedDir(path))
    }

    /// Creates a fresh directory under the system temp dir.
    ///
    /// The directory is kept on disk; removing it is up to the caller.
    pub fn new_tmp() -> io::Result<ConfirmedDir> {
        let dir = tempfile::Builder::new().prefix(TMP_DIR_PREFIX).tempdir()?;
        ConfirmedDir::new(dir.keep())
    }

    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.0.join(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ConfirmedDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for ConfirmedDir {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_canonicalizes() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("a")).unwrap();

        let dir = ConfirmedDir::new(temp.path().join("a").join("..").join("a")).unwrap();
        assert!(dir.as_path().is_absolute());
        assert_eq!(dir.as_path(), temp.path().join("a").canonicalize().unwrap());
    }

    #[test]
    fn new_rejects_missing_path() {
        let temp = tempfile::tempdir().unwrap();
        assert!(ConfirmedDir::new(temp.path().join("missing")).is_err());
    }

    #[test]
    fn new_rejects_files() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();

        let err = ConfirmedDir::new(&file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn new_tmp_is_kept() {
        let dir = ConfirmedDir::new_tmp().unwrap();
        assert!(dir.as_path().is_dir());
        assert!(dir
            .as_path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(TMP_DIR_PREFIX));
        std::fs::remove_dir_all(dir.as_path()).unwrap();
    }
}
