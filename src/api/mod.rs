use std::{fmt::Display, path::PathBuf, str::FromStr};

use log::info;

use crate::{
    filesys::ConfirmedDir,
    git::{Cloner, FullCloner, RepoCache, ShallowCloner, SystemGit},
    model::{
        repo_spec::{Protocol, RepoSpec},
        ParseError,
    },
};

mod builder;

pub use builder::RepoCloneBuilder;

pub struct RepoClone {
    cache: RepoCache,
    git: SystemGit,
    default_protocol: Protocol,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Strategy {
    /// Reuse or create a shallow checkout in the cache directory.
    #[default]
    Shallow,
    /// Build a fresh checkout with submodules in a temporary directory.
    Full,
}

impl FromStr for Strategy {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "shallow" => Ok(Strategy::Shallow),
            "full" => Ok(Strategy::Full),
            _ => Err(ParseError::InvalidField {
                field: "strategy",
                value: value.to_string(),
                reason: "expected `shallow` or `full`",
            }),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Shallow => f.write_str("shallow"),
            Strategy::Full => f.write_str("full"),
        }
    }
}

impl RepoClone {
    pub fn builder() -> RepoCloneBuilder {
        RepoCloneBuilder::default()
    }

    /// Parses `host/org/repo[@ref]`, applying the configured protocol.
    ///
    /// A non-empty `git_ref` overrides the one in `repo`.
    pub fn spec(&self, repo: &str, git_ref: Option<&str>) -> anyhow::Result<RepoSpec> {
        let mut spec = repo.parse::<RepoSpec>()?.with_protocol(self.default_protocol);
        if let Some(git_ref) = git_ref.filter(|r| !r.is_empty()) {
            spec.git_ref = git_ref.to_string();
        }
        Ok(spec)
    }

    /// Obtains a local checkout of `spec` and returns its directory.
    pub fn clone_repo(&self, spec: &mut RepoSpec, strategy: Strategy) -> anyhow::Result<ConfirmedDir> {
        info!("Cloning {} ({} strategy)", spec, strategy);
        match strategy {
            Strategy::Shallow => {
                ShallowCloner::new(&self.git, self.cache.clone()).clone_repo(spec)?
            }
            Strategy::Full => FullCloner::new(&self.git).clone_repo(spec)?,
        }
        spec.dir
            .clone()
            .ok_or_else(|| anyhow::anyhow!("{} strategy did not produce a directory", strategy))
    }

    /// Where a shallow checkout of `spec` lives, whether or not it exists.
    pub fn cache_dir_for(&self, spec: &RepoSpec) -> PathBuf {
        self.cache.entry_path(spec)
    }

    pub fn cache_location(&self) -> &std::path::Path {
        self.cache.location()
    }

    pub fn clear_cache(&self) -> anyhow::Result<()> {
        self.cache.clear()?;
        Ok(())
    }
}
