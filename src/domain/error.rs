//! Domain error types.

/// Top-level error type for trendtrader.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("failed to read {file}: {reason}")]
    Csv { file: String, reason: String },

    #[error("invalid price data: {reason}")]
    InvalidData { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data: have {have} rows, need {needed}")]
    InsufficientData { needed: usize, have: usize },

    #[error("invalid action: {reason}")]
    InvalidAction { reason: String },

    #[error("model error: {0}")]
    Model(#[from] candle_core::Error),

    #[error("checkpoint error at {path}: {reason}")]
    Checkpoint { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendError {
    pub fn invalid_config(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TrendError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TrendError> for std::process::ExitCode {
    fn from(err: &TrendError) -> Self {
        let code: u8 = match err {
            TrendError::Io(_) => 1,
            TrendError::ConfigParse { .. } | TrendError::ConfigInvalid { .. } => 2,
            TrendError::Csv { .. }
            | TrendError::InvalidData { .. }
            | TrendError::InvalidAction { .. } => 3,
            TrendError::Model(_) | TrendError::Checkpoint { .. } => 4,
            TrendError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
