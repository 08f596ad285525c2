use std::{path::PathBuf, time::Duration};

use clap::Parser;
use repoclone::{
    cli::{
        args::{CliArgs, Command},
        command_handlers::{do_clear_cache, do_clone, do_path},
    },
    config::RepoCloneConfig,
    RepoClone,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli_args = CliArgs::parse();
    let config = RepoCloneConfig::load()?;

    let mut builder = RepoClone::builder();
    if let Some(cache_directory) = cli_args
        .cache_directory
        .map(PathBuf::from)
        .or(config.cache_dir)
    {
        builder = builder.cache_directory(cache_directory);
    }
    if let Some(timeout) = cli_args.timeout.map(Duration::from_secs).or(config.timeout) {
        builder = builder.timeout(timeout);
    }
    if let Some(protocol) = config.default_protocol {
        builder = builder.protocol(protocol);
    }
    let api = builder.try_build()?;

    match cli_args.cmd {
        Command::Clone {
            repo,
            git_ref,
            strategy,
            protocol,
        } => do_clone(&api, &repo, git_ref.as_deref(), strategy, protocol),
        Command::Path { repo, git_ref } => do_path(&api, &repo, git_ref.as_deref()),
        Command::ClearCache => do_clear_cache(&api),
    }
}
