use std::path::PathBuf;

use thiserror::Error;

/// Failure to read a workflow document from text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input is empty")]
    Empty,

    #[error("invalid {what}: {message}")]
    Invalid { what: &'static str, message: String },
}

/// Reasons a draft cannot be submitted as a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("workflow name is required")]
    MissingName,

    #[error("trigger is required")]
    MissingTrigger,

    #[error("at least one step is required")]
    NoSteps,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
