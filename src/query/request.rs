use std::fmt;

use sightline_error::QueryError;
use tokio::time::Instant;

use crate::database::{Boundary, Point};

/// Монотонный идентификатор запроса. Первый выданный идентификатор равен 1.
pub type RequestId = u64;

/// Полоса координатора. У каждой полосы свой таймер debounce и свой
/// запрос в полёте; запросы разных полос друг друга не вытесняют.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Text,
    Range,
}

/// Что именно запрошено.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKind {
    /// Автодополнение по префиксу.
    Text(String),
    /// Все точки внутри прямоугольника (видимая область карты).
    Range(Boundary),
}

/// Запрос, принятый координатором.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub kind: QueryKind,
    pub issued_at: Instant,
}

/// Успешный ответ бэкенда.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput<T> {
    Words(Vec<String>),
    Points(Vec<Point<T>>),
}

/// Результат, доставляемый вызывающей стороне.
///
/// Идентификатор позволяет сопоставить ответ с запросом. Результаты одной
/// полосы приходят строго по возрастанию `id`.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    pub id: RequestId,
    pub kind: QueryKind,
    pub outcome: Result<QueryOutput<T>, QueryError>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl QueryKind {
    pub fn lane(&self) -> Lane {
        match self {
            QueryKind::Text(_) => Lane::Text,
            QueryKind::Range(_) => Lane::Range,
        }
    }
}

impl Request {
    pub fn lane(&self) -> Lane {
        self.kind.lane()
    }
}

impl<T> QueryOutput<T> {
    /// Слова текстового ответа; для ответа по области `None`.
    pub fn words(&self) -> Option<&[String]> {
        match self {
            QueryOutput::Words(words) => Some(words),
            QueryOutput::Points(_) => None,
        }
    }

    /// Точки ответа по области; для текстового ответа `None`.
    pub fn points(&self) -> Option<&[Point<T>]> {
        match self {
            QueryOutput::Points(points) => Some(points),
            QueryOutput::Words(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Words(words) => words.len(),
            QueryOutput::Points(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> QueryResult<T> {
    pub fn lane(&self) -> Lane {
        self.kind.lane()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for Lane {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Lane::Text => f.write_str("text"),
            Lane::Range => f.write_str("range"),
        }
    }
}

impl From<&str> for QueryKind {
    fn from(prefix: &str) -> Self {
        QueryKind::Text(prefix.to_string())
    }
}

impl From<Boundary> for QueryKind {
    fn from(range: Boundary) -> Self {
        QueryKind::Range(range)
    }
}
