use serde::{Deserialize, Serialize};
use sightline_error::PrefixError;

/// Допустимый алфавит префиксного индекса.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharSet {
    /// Любой символ Unicode.
    #[default]
    Any,
    /// `a-z`, `A-Z`.
    AsciiLetters,
    /// `a-z`, `A-Z`, `0-9`.
    AsciiAlphanumeric,
    /// Явно перечисленные символы.
    Custom(String),
}

impl CharSet {
    /// Принадлежит ли символ алфавиту.
    pub fn contains(
        &self,
        ch: char,
    ) -> bool {
        match self {
            CharSet::Any => true,
            CharSet::AsciiLetters => ch.is_ascii_alphabetic(),
            CharSet::AsciiAlphanumeric => ch.is_ascii_alphanumeric(),
            CharSet::Custom(chars) => chars.contains(ch),
        }
    }

    /// Принадлежность символа в нижнем регистре алфавиту без учёта
    /// регистра: пользовательский алфавит сравнивается в нижнем регистре.
    fn contains_folded(
        &self,
        ch: char,
    ) -> bool {
        match self {
            CharSet::Custom(chars) => chars.chars().flat_map(char::to_lowercase).any(|c| c == ch),
            _ => self.contains(ch),
        }
    }

    /// Пользовательский алфавит не может быть пустым.
    pub fn validate(&self) -> Result<(), PrefixError> {
        match self {
            CharSet::Custom(chars) if chars.is_empty() => Err(PrefixError::EmptyAlphabet),
            _ => Ok(()),
        }
    }

    /// Приводит слово к форме хранения и проверяет каждый символ.
    ///
    /// Без учёта регистра слово сначала переводится в нижний регистр, и
    /// проверяется уже нормализованная форма против алфавита, тоже
    /// приведённого к нижнему регистру.
    pub fn normalize(
        &self,
        word: &str,
        case_sensitive: bool,
    ) -> Result<Vec<char>, PrefixError> {
        let chars: Vec<char> = if case_sensitive {
            word.chars().collect()
        } else {
            word.chars().flat_map(char::to_lowercase).collect()
        };

        let allowed = |ch: char| {
            if case_sensitive {
                self.contains(ch)
            } else {
                self.contains_folded(ch)
            }
        };

        if let Some(&ch) = chars.iter().find(|&&ch| !allowed(ch)) {
            return Err(PrefixError::InvalidCharacter {
                ch,
                word: word.to_string(),
            });
        }

        Ok(chars)
    }
}
