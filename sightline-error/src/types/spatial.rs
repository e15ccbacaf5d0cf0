use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки пространственного индекса.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    /// Точка лежит за пределами корневой границы; точка не вставлена.
    #[error("Point ({x}, {y}) is outside the root boundary")]
    OutOfBounds { x: f64, y: f64 },
    /// Граница с отрицательным или нечисловым размером.
    #[error("Invalid boundary: {reason}")]
    InvalidBoundary { reason: String },
    /// Недопустимые параметры дерева (ёмкость узла, глубина).
    #[error("Invalid spatial index configuration: {reason}")]
    InvalidConfiguration { reason: String },
    /// Точка с теми же координатами и полезной нагрузкой уже есть в индексе.
    #[error("Point ({x}, {y}) with an equal payload is already indexed")]
    DuplicatePoint { x: f64, y: f64 },
}

impl ErrorExt for SpatialError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::OutOfBounds { .. } => StatusCode::OutOfBounds,
            Self::InvalidBoundary { .. } => StatusCode::InvalidBoundary,
            Self::InvalidConfiguration { .. } => StatusCode::InvalidConfiguration,
            Self::DuplicatePoint { .. } => StatusCode::DuplicatePoint,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", "spatial".to_string()),
            ("status_code", self.status_code().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SpatialError::OutOfBounds { x: 0.0, y: 0.0 }.status_code(),
            StatusCode::OutOfBounds
        );
        assert_eq!(
            SpatialError::InvalidConfiguration {
                reason: "x".into()
            }
            .status_code(),
            StatusCode::InvalidConfiguration
        );
    }

    #[test]
    fn test_out_of_bounds_display() {
        let err = SpatialError::OutOfBounds { x: 101.5, y: 3.0 };
        assert_eq!(
            err.to_string(),
            "Point (101.5, 3) is outside the root boundary"
        );
    }
}
