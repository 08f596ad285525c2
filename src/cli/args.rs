use clap::{Parser, Subcommand};

use crate::{api::Strategy, model::repo_spec::Protocol};

/// Cached, read-only local checkouts of remote git repositories.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Location of the repository cache directory [default: $HOME/.repoclone/repos]
    #[clap(short, long, env = "REPOCLONE_CACHE_DIR")]
    pub cache_directory: Option<String>,
    /// Timeout in seconds for each git invocation [default: 300]
    #[clap(short, long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Obtains a local checkout and prints its path
    Clone {
        /// Repository as host/org/repo[@ref]
        repo: String,
        /// Branch, tag or commit to check out [default: master]
        #[clap(short = 'r', long = "ref")]
        git_ref: Option<String>,
        /// `shallow` reuses the cache, `full` builds a fresh checkout with submodules
        #[clap(short, long, default_value_t = Strategy::Shallow)]
        strategy: Strategy,
        /// Protocol used to reach the remote: https, ssh or file
        #[clap(short, long)]
        protocol: Option<Protocol>,
    },
    /// Prints the cache directory of a repository without cloning it
    Path {
        /// Repository as host/org/repo[@ref]
        repo: String,
        #[clap(short = 'r', long = "ref")]
        git_ref: Option<String>,
    },
    /// Removes every cached checkout
    ClearCache,
}
