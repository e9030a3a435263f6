use std::path::PathBuf;

use thiserror::Error;

use crate::tools::ToolKind;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("core initialisation failed: {0}")]
    Core(String),

    #[error("image decoder initialisation failed: {0}")]
    Decoding(String),

    #[error("tool initialisation failed: {0}")]
    Tools(String),

    #[error("viewport could not be created: {0}")]
    Viewport(String),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("{0} is already registered")]
    AlreadyRegistered(ToolKind),

    #[error("{0} has not been registered")]
    NotRegistered(ToolKind),

    #[error("{0} is not part of tool group `{1}`")]
    NotInGroup(ToolKind, String),

    #[error("no tool group has been created")]
    NoToolGroup,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no viewport is available to display images")]
    NoViewport,

    #[error("none of the {count} image(s) could be decoded: {first}")]
    Undecodable { count: usize, first: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("malformed manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
