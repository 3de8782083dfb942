use config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

pub(crate) type AppResult<T> = Result<T, AppError>;
