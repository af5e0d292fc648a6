//! Error types for tugtype core.
//!
//! Each subsystem owns its error enum. Lookup misses during alignment or
//! call-graph folding are not errors and never surface here.

use thiserror::Error;

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the configuration file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML or a field that failed to deserialize.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A Python version that is not `major.minor`.
    #[error("invalid python version '{value}', expected 'major.minor'")]
    InvalidPythonVersion { value: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_version_message_names_value() {
        let err = ConfigError::InvalidPythonVersion {
            value: "3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid python version '3', expected 'major.minor'"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
