use thiserror::Error;

/// A convenience `Result` alias using [`SyncboardError`].
pub type SyncboardResult<T> = Result<T, SyncboardError>;

/// Top-level error type shared by every SyncBoard crate.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum SyncboardError {
    /// A skill registry operation was rejected (unknown name, duplicate, bad record).
    #[error("Registry error: {0}")]
    Registry(String),

    /// A skill's stored configuration could not be interpreted for its type.
    #[error("Skill config error: {0}")]
    SkillConfig(String),

    /// The underlying skill action failed while executing.
    #[error("Execution error: {0}")]
    Execution(String),

    /// An outbound webhook request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The audit log could not be read or written.
    #[error("Audit error: {0}")]
    Audit(String),

    /// A security policy could not be built.
    #[error("Security error: {0}")]
    Security(String),

    /// Configuration file parsing or validation failed.
    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
