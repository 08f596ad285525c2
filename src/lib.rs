pub mod cli;
pub mod config;
pub mod filesys;
pub mod git;
pub mod model;

mod api;

pub use api::{RepoClone, RepoCloneBuilder, Strategy};
