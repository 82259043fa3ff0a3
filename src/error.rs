use thiserror::Error;

use crate::registry::RegistryError;

/// Unified error type for nuget-pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Package feed error: {0}")]
    Registry(#[source] RegistryError),

    #[error("Release host error: {0}")]
    Release(#[source] RegistryError),

    #[error("Process failed: {0}")]
    Process(String),

    #[error("Package error: {0}")]
    Package(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in nuget-pipeline
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        PipelineError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        PipelineError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        PipelineError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        PipelineError::Remote(msg.into())
    }

    /// Create a process error with context
    pub fn process(msg: impl Into<String>) -> Self {
        PipelineError::Process(msg.into())
    }

    /// Create a package archive error with context
    pub fn package(msg: impl Into<String>) -> Self {
        PipelineError::Package(msg.into())
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Package(err.to_string())
    }
}
