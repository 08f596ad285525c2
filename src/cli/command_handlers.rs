use log::{debug, info};

use crate::{api::Strategy, model::repo_spec::Protocol, RepoClone};

/// Handler to clone command
pub fn do_clone(
    api: &RepoClone,
    repo: &str,
    git_ref: Option<&str>,
    strategy: Strategy,
    protocol: Option<Protocol>,
) -> anyhow::Result<()> {
    let mut spec = api.spec(repo, git_ref)?;
    if let Some(protocol) = protocol {
        spec.protocol = protocol;
    }
    debug!("Resolved {} to {}", repo, spec.clone_spec());

    let dir = api.clone_repo(&mut spec, strategy)?;
    println!("{dir}");
    Ok(())
}

/// Handler to path command
pub fn do_path(api: &RepoClone, repo: &str, git_ref: Option<&str>) -> anyhow::Result<()> {
    let spec = api.spec(repo, git_ref)?;
    let dir = api.cache_dir_for(&spec);
    if !dir.exists() {
        info!("{} has not been cloned yet", spec);
    }
    println!("{}", dir.display());
    Ok(())
}

pub fn do_clear_cache(api: &RepoClone) -> anyhow::Result<()> {
    if !api.cache_location().exists() {
        info!("{} is already removed, nothing to do", api.cache_location().display());
    }
    api.clear_cache()
}
