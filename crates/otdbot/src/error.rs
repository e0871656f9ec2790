use thiserror::Error;

/// Startup-level failures. Stage-level failures live in their own
/// tagged enums (`FetchError`, `GenerateError`, `PublishError`) and are
/// handled by the orchestrator rather than propagated out of `run`.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),
}
