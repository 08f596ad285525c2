//! Local checkouts of remote repositories, produced by driving the `git`
//! executable found on `PATH`.

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

use crate::model::ParseError;

pub mod cache;
pub mod cloner;
pub mod command;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::RepoCache;
pub use cloner::{do_nothing_cloner, Cloner, FullCloner, NoopCloner, ShallowCloner};
pub use command::SystemGit;
pub use runner::GitRunner;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("no 'git' program on path: {0}")]
    MissingGit(#[from] which::Error),
    #[error("Invalid repository spec: {0}")]
    InvalidSpec(#[from] ParseError),
    #[error("Could not create a temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("Cache location {location} is not a directory")]
    BadCacheLocation { location: String },
    #[error("git cmd = '{command}' failed: {status}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },
    #[error("hit {timeout:?} timeout running '{command}'")]
    Timeout { command: String, timeout: Duration },
    #[error("Could not run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("trouble {step} {target}: {source}")]
    Step {
        step: CloneStep,
        target: String,
        #[source]
        source: Box<GitError>,
    },
    #[error("Could not move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

impl GitError {
    /// Combined stdout/stderr captured from the failing git invocation, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { output, .. } => Some(output),
            GitError::Step { source, .. } => source.output(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            GitError::Timeout { .. } => true,
            GitError::Step { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    pub(crate) fn step(step: CloneStep, target: impl Into<String>, source: GitError) -> GitError {
        GitError::Step {
            step,
            target: target.into(),
            source: Box::new(source),
        }
    }
}

/// One git invocation within a clone strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStep {
    Init,
    AddRemote,
    Clone,
    Pull,
    Checkout,
    Reset,
    Submodules,
}

impl Display for CloneStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CloneStep::Init => "initializing empty git repo in",
            CloneStep::AddRemote => "adding remote",
            CloneStep::Clone => "cloning",
            CloneStep::Pull => "pulling",
            CloneStep::Checkout => "checking out ref",
            CloneStep::Reset => "hard resetting empty repository to",
            CloneStep::Submodules => "fetching submodules for",
        })
    }
}

/// Runs `git` with the given arguments inside `dir`.
///
/// Returns the combined output of a successful run.
pub trait GitExecutor {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError>;
}

impl<T: GitExecutor + ?Sized> GitExecutor for &T {
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        (**self).run(dir, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn failed() -> GitError {
        GitError::CommandFailed {
            command: "git fetch".to_string(),
            status: "exit status: 128".to_string(),
            output: "fatal: couldn't find remote ref".to_string(),
        }
    }

    #[test]
    fn step_error_names_step_and_target() {
        let err = GitError::step(CloneStep::Reset, "v1", failed());
        assert_eq!(
            err.to_string(),
            "trouble hard resetting empty repository to v1: git cmd = 'git fetch' failed: exit status: 128"
        );
    }

    #[test]
    fn output_is_reachable_through_steps() {
        let err = GitError::step(CloneStep::Clone, "x", failed());
        assert_eq!(err.output(), Some("fatal: couldn't find remote ref"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn timeout_is_distinguishable() {
        let err = GitError::step(
            CloneStep::Clone,
            "x",
            GitError::Timeout {
                command: "git clone".to_string(),
                timeout: Duration::from_secs(1),
            },
        );
        assert!(err.is_timeout());
        assert_eq!(err.output(), None);
    }
}
