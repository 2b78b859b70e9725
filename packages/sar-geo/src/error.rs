//! Error type for the fallible edges of the core: file loading, config parsing,
//! route validation and command dispatch. The coordinate and planning math
//! itself never fails; it reports "not ready" as `None` or an empty result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("current grid is empty: {0}")]
    EmptyGrid(String),

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

pub type Result<T> = std::result::Result<T, GeoError>;
