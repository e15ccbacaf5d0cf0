use serde::{Deserialize, Serialize};
use sightline_error::{CacheError, SpatialError};

use crate::database::{Boundary, CharSet, DuplicatePolicy};

/// Параметры LRU-кэша.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
}

/// Параметры префиксного индекса.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixConfig {
    /// При `false` все слова и префиксы приводятся к нижнему регистру.
    pub case_sensitive: bool,
    pub alphabet: CharSet,
}

/// Параметры пространственного индекса.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub root_boundary: Boundary,
    /// Сколько точек лист держит до деления на квадранты.
    pub node_capacity: usize,
    /// На этой глубине ёмкость игнорируется и деление прекращается.
    pub max_depth: usize,
    pub duplicates: DuplicatePolicy,
}

/// Параметры координатора запросов.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Окно debounce в миллисекундах. Единого значения по умолчанию нет,
    /// вызывающая сторона выбирает его под свой ввод.
    pub debounce_ms: u32,
    /// Сколько вариантов возвращает текстовый запрос.
    pub autocomplete_limit: usize,
    /// Отбрасывать запрос, совпадающий с последним живым запросом той же
    /// полосы.
    pub distinct: bool,
    /// Ёмкость кэша результатов автодополнения.
    pub memo_capacity: usize,
    /// Сколько последних поисковых строк помнить.
    pub recent_capacity: usize,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl CacheConfig {
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.capacity < 1 {
            return Err(CacheError::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

impl SpatialConfig {
    /// Проверяет границу и параметры деления.
    ///
    /// Исчерпывающей проверки нет: разумный выбор `max_depth` остаётся на
    /// вызывающей стороне. Отвергаются только конфигурации, при которых
    /// дерево не может хранить точки вообще.
    pub fn validate(&self) -> Result<(), SpatialError> {
        self.root_boundary.validate()?;

        if self.node_capacity < 1 {
            return Err(SpatialError::InvalidConfiguration {
                reason: format!("node capacity {} must be at least 1", self.node_capacity),
            });
        }

        Ok(())
    }
}

impl QueryConfig {
    pub fn validate(&self) -> Result<(), CacheError> {
        CacheConfig {
            capacity: self.memo_capacity,
        }
        .validate()?;
        CacheConfig {
            capacity: self.recent_capacity,
        }
        .validate()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            alphabet: CharSet::Any,
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            root_boundary: Boundary::new(0.0, 0.0, 100.0, 100.0),
            node_capacity: 4,
            max_depth: 16,
            duplicates: DuplicatePolicy::Retain,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            autocomplete_limit: 10,
            distinct: true,
            memo_capacity: 64,
            recent_capacity: 16,
        }
    }
}
