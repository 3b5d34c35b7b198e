use thiserror::Error;

use hue::error::HueError;

#[derive(Error, Debug)]
pub enum ApiError {
    /* mapped errors */
    #[error(transparent)]
    HueError(#[from] HueError),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    SetLoggerError(#[from] log::SetLoggerError),

    /* bridge errors */
    #[error("[{bridge}] Event stream failed {attempts} times in a row, giving up")]
    EventStreamExhausted { bridge: String, attempts: u32 },

    #[error("[{bridge}] Bridge error during {action}: {status}")]
    BridgeStatus {
        bridge: String,
        action: String,
        status: String,
    },

    #[error("Bridge {0:?} is not configured")]
    UnknownBridge(String),

    #[error("Invalid color {0:?} (expected #rrggbb)")]
    InvalidColor(String),

    #[error("Service error: {0}")]
    ServiceError(String),
}

impl ApiError {
    #[must_use]
    pub fn service_error(msg: impl Into<String>) -> Self {
        Self::ServiceError(msg.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
