use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure or timeout talking to the provider.
    #[error("transport: {0}")]
    Transport(String),

    /// Provider answered with `ok: false`. The message is the provider's own.
    #[error("provider: {0}")]
    Provider(String),

    #[error("decode: {0}")]
    Decode(String),

    #[error("persistence: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("config: {0}")]
    Config(String),
}

impl PipelineError {
    /// Errors that leave local state untouched and are worth retrying later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Provider(_) | Self::Decode(_) | Self::Persistence(_)
        )
    }
}
