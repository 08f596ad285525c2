use std::time::Duration;

use crate::filesys::ConfirmedDir;

use super::{GitError, GitExecutor, SystemGit};

/// Runs git commands inside a single working directory.
pub struct GitRunner<E = SystemGit> {
    git: E,
    dir: ConfirmedDir,
}

impl GitRunner<SystemGit> {
    /// Finds `git` on `PATH` and allocates a fresh temporary working directory.
    pub fn new(timeout: Duration) -> Result<GitRunner<SystemGit>, GitError> {
        let git = SystemGit::locate(timeout)?;
        let dir = ConfirmedDir::new_tmp().map_err(GitError::TempDir)?;
        Ok(GitRunner { git, dir })
    }
}

impl<E: GitExecutor> GitRunner<E> {
    pub fn with_executor(git: E, dir: ConfirmedDir) -> GitRunner<E> {
        GitRunner { git, dir }
    }

    pub fn run(&self, args: &[&str]) -> Result<String, GitError> {
        self.git.run(self.dir.as_path(), args)
    }

    pub fn dir(&self) -> &ConfirmedDir {
        &self.dir
    }

    pub fn into_dir(self) -> ConfirmedDir {
        self.dir
    }
}
