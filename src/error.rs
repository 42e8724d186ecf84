use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not signed in")]
    Unauthenticated,

    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, UpgradeError>;
