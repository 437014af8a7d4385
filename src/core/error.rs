/// Error types shared by the session engine
use thiserror::Error;

/// Failure reported by a [`RenderSink`](crate::core::renderer::RenderSink).
///
/// Sinks never get retried: any of these tears the session down.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The output target is gone (chat deleted, message too old, pipe closed...)
    #[error("render target is no longer valid: {0}")]
    TargetGone(String),

    #[error("render transport failed: {0}")]
    Transport(String),
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors that end a single session. Nothing here ever crosses into other sessions.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("render failed: {0}")]
    RenderFailure(#[from] RenderError),

    /// Something that should be impossible happened inside the game rules.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
