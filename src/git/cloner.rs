use std::path::Path;

use log::{info, warn};

use crate::{
    filesys::ConfirmedDir,
    model::repo_spec::{RepoSpec, DEFAULT_REF},
};

use super::{CloneStep, GitError, GitExecutor, GitRunner, RepoCache};

/// Produces a local checkout for a spec and records it in `spec.dir`.
///
/// `spec.dir` is only written when the whole operation succeeds.
pub trait Cloner {
    fn clone_repo(&self, spec: &mut RepoSpec) -> Result<(), GitError>;
}

fn log_output(step: CloneStep, err: &GitError) {
    if let Some(output) = err.output() {
        info!("Error {} repository: {}", step, output);
    }
}

/// Shallow, single-branch checkouts kept in a [`RepoCache`].
///
/// An existing entry is reused as-is; it is never refreshed.
pub struct ShallowCloner<E> {
    git: E,
    cache: RepoCache,
}

impl<E: GitExecutor> ShallowCloner<E> {
    pub fn new(git: E, cache: RepoCache) -> ShallowCloner<E> {
        ShallowCloner { git, cache }
    }

    fn clone_into(&self, spec: &RepoSpec, target: &Path) -> Result<(), GitError> {
        let scratch = self.cache.scratch_dir()?;
        let clone_spec = spec.clone_spec();

        // git clone --depth 1 -b <ref> --single-branch <url> .
        self.git
            .run(
                scratch.path(),
                &[
                    "clone",
                    "--depth",
                    "1",
                    "-b",
                    &spec.git_ref,
                    "--single-branch",
                    &clone_spec,
                    ".",
                ],
            )
            .map_err(|err| {
                log_output(CloneStep::Clone, &err);
                GitError::step(CloneStep::Clone, &clone_spec, err)
            })?;

        match std::fs::rename(scratch.path(), target) {
            Ok(()) => {
                let _ = scratch.keep();
                Ok(())
            }
            Err(source) => {
                let from = scratch.path().to_path_buf();
                if let Err(error) = scratch.close() {
                    warn!("Could not remove {}: {}", from.display(), error);
                }
                Err(GitError::Move {
                    from,
                    to: target.to_path_buf(),
                    source,
                })
            }
        }
    }
}

impl<E: GitExecutor> Cloner for ShallowCloner<E> {
    fn clone_repo(&self, spec: &mut RepoSpec) -> Result<(), GitError> {
        spec.validate()?;
        spec.apply_default_ref();
        self.cache.ensure_location()?;

        let target = self.cache.entry_path(spec);
        info!("visited git repo: {}", spec.cache_key());

        if target.exists() {
            info!("Reusing cached checkout at {}", target.display());
        } else {
            self.clone_into(spec, &target)?;
        }

        spec.dir = Some(ConfirmedDir::new(&target)?);
        Ok(())
    }
}

/// Checkouts built step by step in a fresh temporary directory, with
/// submodules. Nothing is cached, and a failed attempt leaves its
/// directory behind.
pub struct FullCloner<E> {
    git: E,
}

impl<E: GitExecutor> FullCloner<E> {
    pub fn new(git: E) -> FullCloner<E> {
        FullCloner { git }
    }
}

impl<E: GitExecutor> Cloner for FullCloner<E> {
    fn clone_repo(&self, spec: &mut RepoSpec) -> Result<(), GitError> {
        spec.validate()?;
        let dir = ConfirmedDir::new_tmp().map_err(GitError::TempDir)?;
        let runner = GitRunner::with_executor(&self.git, dir);
        let step = |step: CloneStep, target: &str| {
            let target = target.to_string();
            move |err: GitError| {
                log_output(step, &err);
                GitError::step(step, target, err)
            }
        };

        let dir = runner.dir().to_string();
        runner
            .run(&["init", &dir])
            .map_err(step(CloneStep::Init, &dir))?;

        let clone_spec = spec.clone_spec();
        runner
            .run(&["remote", "add", "origin", &clone_spec])
            .map_err(step(CloneStep::AddRemote, &clone_spec))?;

        spec.apply_default_ref();
        let git_ref = spec.git_ref.clone();
        if let Err(error) = runner.run(&["fetch", "--depth=1", "origin", &git_ref]) {
            // Any fetch failure takes this path, not only a missing ref.
            warn!(
                "Shallow fetch of {} failed, pulling {} instead: {}",
                git_ref, DEFAULT_REF, error
            );
            runner
                .run(&["pull", "origin", DEFAULT_REF])
                .map_err(step(CloneStep::Pull, &spec.org_repo))?;
            runner
                .run(&["checkout", &git_ref])
                .map_err(step(CloneStep::Checkout, &git_ref))?;
        }

        runner
            .run(&["reset", "--hard", "FETCH_HEAD"])
            .map_err(step(CloneStep::Reset, &git_ref))?;

        runner
            .run(&["submodule", "update", "--init", "--recursive"])
            .map_err(step(CloneStep::Submodules, &git_ref))?;

        spec.dir = Some(runner.into_dir());
        Ok(())
    }
}

/// Assigns a directory that already exists, for tests that must not touch
/// git or the network.
#[derive(Debug, Clone)]
pub struct NoopCloner {
    dir: ConfirmedDir,
}

pub fn do_nothing_cloner(dir: ConfirmedDir) -> NoopCloner {
    NoopCloner { dir }
}

impl Cloner for NoopCloner {
    fn clone_repo(&self, spec: &mut RepoSpec) -> Result<(), GitError> {
        spec.dir = Some(self.dir.clone());
        Ok(())
    }
}
