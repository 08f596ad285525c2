use thiserror::Error;

pub mod repo_spec;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing url component `{0}` in string `{1}`")]
    MissingUrlComponent(String, String),
    #[error("Invalid protocol: {0}")]
    InvalidProtocol(String),
    #[error("Invalid {field} `{value}`: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}
