//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A configuration source could not be read or merged
    #[error("Failed to load configuration from {source_name}: {reason}")]
    SourceError { source_name: String, reason: String },

    /// The merged configuration does not match the expected shape
    #[error("Failed to parse configuration: {reason}")]
    ParseError { reason: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read file {path}: {reason}")]
    FileReadError { path: String, reason: String },
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn file_read_error(path: impl Into<String>, error: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.into(),
            reason: error.to_string(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        match error {
            config::ConfigError::Foreign(inner) => Self::SourceError {
                source_name: "environment".to_string(),
                reason: inner.to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => Self::SourceError {
                source_name: uri.unwrap_or_else(|| "configuration file".to_string()),
                reason: cause.to_string(),
            },
            other => Self::ParseError {
                reason: other.to_string(),
            },
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
