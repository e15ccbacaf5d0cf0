use std::any::Any;

use sightline_error::{CacheError, ErrorExt, PrefixError, SpatialError, StatusCode};
use thiserror::Error;

/// Ошибки загрузки и проверки настроек, включая настройки логирования.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid cache settings: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid prefix index settings: {0}")]
    Prefix(#[from] PrefixError),

    #[error("Invalid spatial index settings: {0}")]
    Spatial(#[from] SpatialError),

    #[error("Invalid logging settings: {reason}")]
    Logging { reason: String },

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

impl ErrorExt for SettingsError {
    fn status_code(&self) -> StatusCode {
        match self {
            SettingsError::Cache(e) => e.status_code(),
            SettingsError::Prefix(e) => e.status_code(),
            SettingsError::Spatial(e) => e.status_code(),
            SettingsError::Subscriber(_) => StatusCode::Internal,
            SettingsError::Load(_) | SettingsError::Logging { .. } => {
                StatusCode::InvalidConfiguration
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use sightline_error::StackError;

    use super::*;

    #[test]
    fn test_status_code_follows_source() {
        let err = SettingsError::from(CacheError::InvalidCapacity { capacity: 0 });
        assert_eq!(err.status_code(), StatusCode::InvalidCapacity);

        let err = SettingsError::Logging {
            reason: "unknown level".into(),
        };
        assert_eq!(err.status_code(), StatusCode::InvalidConfiguration);
    }

    #[test]
    fn test_into_stack_error() {
        let err = StackError::from(SettingsError::from(SpatialError::InvalidBoundary {
            reason: "zero width".into(),
        }))
        .context("loading settings");

        assert_eq!(err.status_code(), StatusCode::InvalidBoundary);
        assert!(err.downcast_ref::<SettingsError>().is_some());
        assert!(err.to_string().contains("loading settings"));
    }
}
