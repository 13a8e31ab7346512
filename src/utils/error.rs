use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClubError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data validation error: {message}")]
    ValidationError { message: String },

    #[error("Query returned no result")]
    NoResult,

    #[error("Query returned {count} rows where exactly one was expected")]
    NonUniqueResult { count: usize },

    #[error("Query parameter '{name}' is not bound")]
    UnboundParameter { name: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Query execution error: {message}")]
    QueryError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Data,
    Query,
    System,
}

impl ClubError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClubError::ConfigError { .. }
            | ClubError::MissingConfigError { .. }
            | ClubError::InvalidConfigValueError { .. }
            | ClubError::TomlError(_) => ErrorCategory::Config,
            ClubError::ValidationError { .. } | ClubError::CsvError(_) => ErrorCategory::Data,
            ClubError::NoResult
            | ClubError::NonUniqueResult { .. }
            | ClubError::UnboundParameter { .. }
            | ClubError::TypeMismatch { .. }
            | ClubError::QueryError { .. } => ErrorCategory::Query,
            ClubError::IoError(_) | ClubError::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// CLI 結束代碼
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Config => 2,
            ErrorCategory::Data => 3,
            ErrorCategory::Query => 4,
            ErrorCategory::System => 1,
        }
    }

    pub(crate) fn type_mismatch(expected: &str, found: impl std::fmt::Debug) -> Self {
        ClubError::TypeMismatch {
            expected: expected.to_string(),
            found: format!("{:?}", found),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(ClubError::NoResult.category(), ErrorCategory::Query);
        assert_eq!(
            ClubError::ValidationError {
                message: "bad sex".to_string()
            }
            .category(),
            ErrorCategory::Data
        );
        assert_eq!(
            ClubError::MissingConfigError {
                field: "dataset.path".to_string()
            }
            .exit_code(),
            2
        );
    }
}
