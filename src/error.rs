use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type ConfigError = Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    pub fn is_temporary(&self) -> bool {
        matches!(self, Error::Io(_) | Error::QuotaExceeded(_))
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidUrl(_)
                | Error::Config(_)
                | Error::PermissionDenied(_)
                | Error::NotFound(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Config(_) => "CONFIG",
            Error::Storage(_) => "STORAGE",
            Error::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            Error::Validation(_) => "VALIDATION",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::PermissionDenied(_) => "PERMISSION_DENIED",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Invalid(_) => "INVALID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = Error::Validation("title is required".to_string());
        assert!(err.is_user_error());
        assert!(!err.is_temporary());
        assert_eq!(err.error_code(), "VALIDATION");

        let err = Error::QuotaExceeded("articles".to_string());
        assert!(err.is_temporary());
        assert_eq!(err.error_code(), "QUOTA_EXCEEDED");
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let err: Error = toml::from_str::<toml::Value>("this is = = not toml")
            .unwrap_err()
            .into();
        assert_eq!(err.error_code(), "CONFIG");
    }
}
