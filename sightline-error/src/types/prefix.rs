use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки префиксного индекса.
///
/// Любая из них означает, что операция прервана, а индекс не изменился.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    /// Символ за пределами настроенного алфавита.
    #[error("Character {ch:?} in {word:?} is outside the configured alphabet")]
    InvalidCharacter { ch: char, word: String },
    /// Пользовательский алфавит не содержит ни одного символа.
    #[error("Custom alphabet must contain at least one character")]
    EmptyAlphabet,
}

impl ErrorExt for PrefixError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCharacter { .. } => StatusCode::InvalidCharacter,
            Self::EmptyAlphabet => StatusCode::EmptyAlphabet,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "prefix".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        if let Self::InvalidCharacter { ch, .. } = self {
            tags.push(("character", ch.to_string()));
        }

        tags
    }
}
