use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StackError, StatusCode};

/// Ошибки, доставляемые координатором запросов.
///
/// Отменённые (вытесненные) запросы сюда не попадают: их результат просто
/// не доставляется.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Ошибка бэкенда, помеченная идентификатором исходного запроса.
    #[error("Backend call for request #{id} failed: {source}")]
    BackendFailure { id: u64, source: StackError },
    /// Координатор остановлен, запрос не принят.
    #[error("Query coordinator is closed")]
    CoordinatorClosed,
    /// `submit` вызван вне runtime tokio: таймер debounce негде запустить.
    #[error("No tokio runtime to schedule the debounce timer on")]
    RuntimeUnavailable,
}

impl QueryError {
    /// Идентификатор запроса, к которому относится ошибка.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Self::BackendFailure { id, .. } => Some(*id),
            Self::CoordinatorClosed | Self::RuntimeUnavailable => None,
        }
    }

    /// Статус-код исходной ошибки бэкенда, если он есть.
    pub fn backend_status(&self) -> Option<StatusCode> {
        match self {
            Self::BackendFailure { source, .. } => Some(source.status_code()),
            Self::CoordinatorClosed | Self::RuntimeUnavailable => None,
        }
    }
}

impl ErrorExt for QueryError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BackendFailure { .. } => StatusCode::BackendFailure,
            Self::CoordinatorClosed => StatusCode::CoordinatorClosed,
            Self::RuntimeUnavailable => StatusCode::RuntimeUnavailable,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::BackendFailure { source, .. } => source.client_message(),
            Self::CoordinatorClosed | Self::RuntimeUnavailable => self.to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "query".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        if let Self::BackendFailure { id, source } = self {
            tags.push(("request_id", id.to_string()));
            tags.push(("backend_status", source.status_code().to_string()));
        }

        tags
    }
}
