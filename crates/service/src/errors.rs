use thiserror::Error;

use crate::params::ValidationReport;

/// Failures of the file-backed cache. Kept separate so callers can fall back
/// to uncached calls.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(String),
    #[error("cache serialization error: {0}")]
    Serde(String),
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("request build error: {0}")]
    Build(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {message}")]
    Config { message: String, help: Option<String> },
    #[error("invalid arguments: {}", .report.errors.join("; "))]
    Validation { report: ValidationReport, help: Option<String> },
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("upstream returned HTTP {status}")]
    Http { status: u16, body: serde_json::Value },
    #[error("graphql errors: {0}")]
    GraphQl(serde_json::Value),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into(), help: None }
    }

    /// Human-readable hint attached to configuration and validation errors.
    pub fn help(&self) -> Option<&str> {
        match self {
            Self::Config { help, .. } | Self::Validation { help, .. } => help.as_deref(),
            _ => None,
        }
    }
}
