use super::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid protocol: {0}")]
    Protocol(String),

    #[error("Invalid protocol event #{index} at t={at}s: {reason}")]
    ProtocolEvent {
        index: usize,
        at: f64,
        reason: &'static str,
    },
}
