use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::{filesys::ConfirmedDir, model::ParseError};

/// Ref used when a spec does not name one.
pub const DEFAULT_REF: &str = "master";

/// A remote repository and the ref to check out of it.
///
/// `dir` stays `None` until a cloner has produced a local checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub host: String,
    pub org_repo: String,
    pub git_ref: String,
    pub protocol: Protocol,
    pub dir: Option<ConfirmedDir>,
}

impl RepoSpec {
    pub fn new(
        host: impl Into<String>,
        org_repo: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> RepoSpec {
        RepoSpec {
            host: host.into(),
            org_repo: org_repo.into(),
            git_ref: git_ref.into(),
            protocol: Protocol::default(),
            dir: None,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> RepoSpec {
        self.protocol = protocol;
        self
    }

    /// The ref that will actually be cloned.
    pub fn resolved_ref(&self) -> &str {
        if self.git_ref.is_empty() {
            DEFAULT_REF
        } else {
            &self.git_ref
        }
    }

    pub(crate) fn apply_default_ref(&mut self) {
        if self.git_ref.is_empty() {
            self.git_ref = DEFAULT_REF.to_string();
        }
    }

    /// Name of the cache directory holding this checkout.
    ///
    /// Path separators are flattened so every key is a single directory
    /// directly under the cache root.
    pub fn cache_key(&self) -> String {
        format!("{}_{}_{}", self.host, self.org_repo, self.resolved_ref()).replace('/', "_")
    }

    /// Location handed to `git` to reach the remote.
    pub fn clone_spec(&self) -> String {
        let org_repo = self.org_repo.trim_end_matches('/');
        match self.protocol {
            Protocol::Https => format!("https://{}/{}", self.host, with_git_suffix(org_repo)),
            Protocol::Ssh => format!("git@{}:{}", self.host, with_git_suffix(org_repo)),
            Protocol::File => format!("file://{}/{}", self.host, org_repo),
        }
    }

    pub fn dir(&self) -> Option<&ConfirmedDir> {
        self.dir.as_ref()
    }

    /// Rejects specs that cannot be safely passed to `git`.
    pub fn validate(&self) -> Result<(), ParseError> {
        check_field("host", &self.host, false)?;
        check_field("org_repo", &self.org_repo, true)?;
        check_field("ref", self.resolved_ref(), true)?;
        if self.org_repo.contains('\\') {
            return Err(invalid("org_repo", &self.org_repo, "contains a backslash"));
        }
        Ok(())
    }
}

fn with_git_suffix(org_repo: &str) -> String {
    if org_repo.ends_with(".git") {
        org_repo.to_string()
    } else {
        format!("{org_repo}.git")
    }
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> ParseError {
    ParseError::InvalidField {
        field,
        value: value.to_string(),
        reason,
    }
}

fn check_field(field: &'static str, value: &str, reject_traversal: bool) -> Result<(), ParseError> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value.starts_with('-') {
        return Err(invalid(field, value, "must not start with '-'"));
    }
    if reject_traversal && value.contains("..") {
        return Err(invalid(field, value, "must not contain '..'"));
    }
    if value.chars().any(char::is_control) {
        return Err(invalid(field, value, "must not contain control characters"));
    }
    Ok(())
}

impl FromStr for RepoSpec {
    type Err = ParseError;

    /// Parses `host/org/repo[@ref]`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let re: Regex = Regex::new(
            r"^(?P<host>[^/@]+)/(?P<org_repo>[^@]+?)/?(?:@(?P<git_ref>[^@]+))?$",
        )
        .unwrap();
        let captures = re.captures(value).ok_or_else(|| mismatch(value))?;

        let host = captures
            .name("host")
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| mismatch(value))?;
        let org_repo = captures
            .name("org_repo")
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| mismatch(value))?;
        let git_ref = captures
            .name("git_ref")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Ok(RepoSpec::new(host, org_repo, git_ref))
    }
}

/// Names the part of `value` that keeps it from being `host/org/repo[@ref]`.
fn mismatch(value: &str) -> ParseError {
    let path = value.split('@').next().unwrap_or_default();
    let (host, org_repo) = path.split_once('/').unwrap_or((path, ""));
    if host.is_empty() {
        ParseError::MissingUrlComponent("host".to_string(), value.to_string())
    } else if org_repo.trim_matches('/').is_empty() {
        ParseError::MissingUrlComponent("org_repo".to_string(), value.to_string())
    } else {
        invalid("repo", value, "expected host/org/repo[@ref]")
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.host, self.org_repo, self.resolved_ref())
    }
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Protocol {
    #[default]
    #[serde(rename = "https")]
    Https,
    #[serde(rename = "ssh")]
    Ssh,
    #[serde(rename = "file")]
    File,
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.to_ascii_lowercase();
        match value.as_str() {
            "https" => Ok(Protocol::Https),
            "ssh" => Ok(Protocol::Ssh),
            "file" => Ok(Protocol::File),
            _ => Err(ParseError::InvalidProtocol(value)),
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Https => f.write_str("https"),
            Protocol::Ssh => f.write_str("ssh"),
            Protocol::File => f.write_str("file"),
        }
    }
}
