use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File, FileFormat};
use home::home_dir;
use serde::Deserialize;

use crate::model::repo_spec::Protocol;

const CONFIG_FILE: &str = ".repoclone/config.toml";

pub struct RepoCloneConfig {
    pub cache_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub default_protocol: Option<Protocol>,
}

impl RepoCloneConfig {
    /// Reads `$HOME/.repoclone/config.toml` (if present) and `REPOCLONE_*`
    /// environment variables, the latter taking precedence.
    pub fn load() -> anyhow::Result<Self> {
        let file = home_dir().map(|home| home.join(CONFIG_FILE));
        let raw_config = RawConfig::load(file.as_deref(), None)?;

        Ok(Self {
            cache_dir: raw_config.cache.dir,
            timeout: raw_config.git.timeout.map(Duration::from_secs),
            default_protocol: raw_config.git.protocol,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    git: GitConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct CacheConfig {
    dir: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct GitConfig {
    protocol: Option<Protocol>,
    /// Seconds.
    timeout: Option<u64>,
}

impl RawConfig {
    fn load(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(File::from(file).format(FileFormat::Toml).required(false));
        }
        builder
            .add_source(
                Environment::with_prefix("REPOCLONE")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(None, Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                cache: CacheConfig { dir: None },
                git: GitConfig {
                    protocol: None,
                    timeout: None
                }
            }
        )
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([
            ("REPOCLONE_CACHE_DIR".to_owned(), "/cache".to_owned()),
            ("REPOCLONE_GIT_PROTOCOL".to_owned(), "ssh".to_owned()),
            ("REPOCLONE_GIT_TIMEOUT".to_owned(), "30".to_owned()),
        ]);
        let config = RawConfig::load(None, Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                cache: CacheConfig {
                    dir: Some("/cache".into())
                },
                git: GitConfig {
                    protocol: Some(Protocol::Ssh),
                    timeout: Some(30)
                }
            }
        )
    }

    #[test]
    fn load_file_with_environment_override() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("config.toml");
        std::fs::write(
            &file,
            "[cache]\ndir = \"/from-file\"\n\n[git]\nprotocol = \"file\"\ntimeout = 60\n",
        )
        .unwrap();
        let env = HashMap::from([("REPOCLONE_CACHE_DIR".to_owned(), "/from-env".to_owned())]);

        let config = RawConfig::load(Some(&file), Some(env)).unwrap();
        assert_eq!(
            config,
            RawConfig {
                cache: CacheConfig {
                    dir: Some("/from-env".into())
                },
                git: GitConfig {
                    protocol: Some(Protocol::File),
                    timeout: Some(60)
                }
            }
        )
    }

    #[test]
    fn missing_file_is_ignored() {
        let temp = tempfile::tempdir().unwrap();
        let config =
            RawConfig::load(Some(&temp.path().join("absent.toml")), Some(HashMap::new())).unwrap();
        assert_eq!(config, RawConfig::default());
    }
}
