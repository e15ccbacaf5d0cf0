use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки и конфигурация
/// - 2xxx: LRU-кэш
/// - 3xxx: Префиксный индекс
/// - 4xxx: Пространственный индекс
/// - 5xxx: Координатор запросов
///
/// `num_enum::TryFromPrimitive` даёт реализацию `TryFrom<u32>`; `strum` и
/// `serde_repr` подключаются опционально.
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Internal = 1001,
    InvalidArgs = 1002,
    InvalidConfiguration = 1003,

    // === 2xxx: LRU-кэш ===
    InvalidCapacity = 2000,

    // === 3xxx: Префиксный индекс ===
    InvalidCharacter = 3000,
    EmptyAlphabet = 3001,

    // === 4xxx: Пространственный индекс ===
    OutOfBounds = 4000,
    InvalidBoundary = 4001,
    DuplicatePoint = 4002,

    // === 5xxx: Координатор запросов ===
    BackendFailure = 5000,
    CoordinatorClosed = 5001,
    RuntimeUnavailable = 5002,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка вызвана входными данными вызывающей стороны, а не сбоем
    /// внутри индекса.
    ///
    /// Структурные ошибки (`2xxx..4xxx`) и ошибки конфигурации никогда не
    /// повторяются автоматически.
    pub fn is_client_error(&self) -> bool {
        let c = self.code();
        if (2000..=4999).contains(&c) {
            return true;
        }
        matches!(self, Self::InvalidArgs | Self::InvalidConfiguration)
    }

    /// Ошибка пришла от бэкенда или самого координатора (диапазон 5xxx).
    pub fn is_query_error(&self) -> bool {
        (5000..=5999).contains(&self.code())
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::OutOfBounds | Self::InvalidCharacter | Self::DuplicatePoint => LogLevel::Debug,
            Self::InvalidArgs
            | Self::InvalidConfiguration
            | Self::InvalidCapacity
            | Self::EmptyAlphabet
            | Self::InvalidBoundary => LogLevel::Info,
            Self::BackendFailure | Self::CoordinatorClosed | Self::RuntimeUnavailable => {
                LogLevel::Warn
            }
            Self::Unknown | Self::Internal => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
