use std::{path::PathBuf, time::Duration};

use anyhow::anyhow;
use home::home_dir;

use crate::{
    git::{RepoCache, SystemGit},
    model::repo_spec::Protocol,
    RepoClone,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Default)]
pub struct RepoCloneBuilder {
    cache_directory_path: Option<PathBuf>,
    timeout: Option<Duration>,
    protocol: Option<Protocol>,
}

impl RepoCloneBuilder {
    /// Location of the repository cache directory.
    ///
    /// Defaults to `$HOME/.repoclone/repos`.
    pub fn cache_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_directory_path = Some(path.into());
        self
    }

    /// Upper bound for every single git invocation.
    ///
    /// Defaults to five minutes.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Protocol used to reach repositories given as `host/org/repo`.
    ///
    /// Defaults to `https`.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn try_build(self) -> anyhow::Result<RepoClone> {
        let Self {
            cache_directory_path,
            timeout,
            protocol,
        } = self;

        let cache_directory = match cache_directory_path {
            Some(path) => path,
            None => default_cache_directory()?,
        };

        let git = SystemGit::locate(timeout.unwrap_or(DEFAULT_TIMEOUT))?;

        Ok(RepoClone {
            cache: RepoCache::new(cache_directory),
            git,
            default_protocol: protocol.unwrap_or_default(),
        })
    }
}

fn default_cache_directory() -> anyhow::Result<PathBuf> {
    let mut cache_directory =
        home_dir().ok_or_else(|| anyhow!("Could not find home dir. Please define $HOME env variable."))?;
    cache_directory.push(".repoclone/repos");
    Ok(cache_directory)
}
