use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("no telemetry collected")]
    NoTelemetry,
    #[error("io error: {0}")]
    Io(String),
    #[error("csv error: {0}")]
    Csv(String),
    #[error("json error: {0}")]
    Json(String),
}

impl From<std::io::Error> for SentinelError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<csv::Error> for SentinelError {
    fn from(error: csv::Error) -> Self {
        Self::Csv(error.to_string())
    }
}

impl From<serde_json::Error> for SentinelError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}
