use thiserror::Error;

/// Errors from the config persistence layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading or writing the config file
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file exists but is not valid JSON
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}
