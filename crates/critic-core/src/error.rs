use std::path::PathBuf;

/// Errors that can occur across the critic review pipeline.
///
/// Each variant names a failure class the pipeline reacts to differently:
/// [`Transient`](CriticError::Transient) and [`Model`](CriticError::Model)
/// are retried, everything else is surfaced immediately. Library crates use
/// this type directly; the binary converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use critic_core::CriticError;
///
/// let err = CriticError::Config("missing OPENAI_API_KEY".into());
/// assert!(err.to_string().contains("OPENAI_API_KEY"));
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CriticError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check .critic.toml and the required environment variables"))]
    Config(String),

    /// Credentials were rejected by a remote service (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The pull request or a file in it does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure, timeout or server-side (5xx/429) error.
    #[error("transient error: {0}")]
    Transient(String),

    /// Any other unexpected HTTP status from a remote API.
    #[error("API error: {0}")]
    Api(String),

    /// Completion call failed or exhausted its retries.
    #[error("model error: {0}")]
    Model(String),

    /// The completion response did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Posting the review comment was rejected.
    #[error("publish error: {0}")]
    Publish(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl CriticError {
    /// Whether a failed call that produced this error is worth repeating.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::CriticError;
    ///
    /// assert!(CriticError::Transient("502 Bad Gateway".into()).is_retryable());
    /// assert!(!CriticError::Auth("401 Unauthorized".into()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Model(_))
    }
}
