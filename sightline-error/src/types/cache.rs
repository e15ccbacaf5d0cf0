use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки LRU-кэша.
///
/// Промах (`get` по отсутствующему ключу) ошибкой не является.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Ёмкость меньше единицы.
    #[error("Invalid cache capacity {capacity}: must be at least 1")]
    InvalidCapacity { capacity: usize },
}

impl ErrorExt for CacheError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCapacity { .. } => StatusCode::InvalidCapacity,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "cache".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::InvalidCapacity { capacity } => tags.push(("capacity", capacity.to_string())),
        }

        tags
    }
}
