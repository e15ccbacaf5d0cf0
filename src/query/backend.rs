use async_trait::async_trait;
use parking_lot::Mutex;
use sightline_error::{bail, CacheError, PrefixError, SightlineResult, SpatialError};

use super::CancelToken;
use crate::{
    config::QueryConfig,
    database::{Boundary, LruCache, Point, PrefixIndex, SpatialIndex},
};

/// Источник ответов для координатора.
///
/// Вызов может быть синхронным по сути (индексы в памяти) или удалённым.
/// Токен отмены передаётся в обоих случаях; проверять его бэкенд не
/// обязан.
#[async_trait]
pub trait QueryBackend<T: Send + 'static>: Send + Sync {
    /// До `limit` слов, начинающихся с `prefix`.
    async fn autocomplete(
        &self,
        prefix: &str,
        limit: usize,
        cancel: &CancelToken,
    ) -> SightlineResult<Vec<String>>;

    /// Все точки внутри `range`.
    async fn range(
        &self,
        range: &Boundary,
        cancel: &CancelToken,
    ) -> SightlineResult<Vec<Point<T>>>;
}

/// Бэкенд поверх индексов в памяти.
///
/// Владеет префиксным и пространственным индексами и двумя LRU-кэшами:
/// результатов автодополнения и последних поисковых строк. Каждая часть
/// закрыта своим мьютексом.
///
/// Кэш автодополнения меняется только под мьютексом префиксного индекса
/// (порядок захвата: `prefix`, затем `memo`). Поэтому ответ, посчитанный
/// до изменения слов, не может попасть в кэш после его сброса.
pub struct IndexBackend<T> {
    prefix: Mutex<PrefixIndex>,
    spatial: Mutex<SpatialIndex<T>>,
    memo: Mutex<LruCache<(String, usize), Vec<String>>>,
    recent: Mutex<LruCache<String, ()>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<T: PartialEq> IndexBackend<T> {
    pub fn new(
        prefix: PrefixIndex,
        spatial: SpatialIndex<T>,
        config: &QueryConfig,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            prefix: Mutex::new(prefix),
            spatial: Mutex::new(spatial),
            memo: Mutex::new(LruCache::new(config.memo_capacity)?),
            recent: Mutex::new(LruCache::new(config.recent_capacity)?),
        })
    }

    /// Добавляет слово в префиксный индекс. Кэш автодополнения
    /// сбрасывается, если слово новое.
    pub fn insert_word(
        &self,
        word: &str,
    ) -> Result<bool, PrefixError> {
        let mut index = self.prefix.lock();
        let inserted = index.insert(word)?;
        if inserted {
            self.memo.lock().clear();
        }
        Ok(inserted)
    }

    /// Удаляет слово. Кэш автодополнения сбрасывается, если слово было.
    pub fn delete_word(
        &self,
        word: &str,
    ) -> Result<bool, PrefixError> {
        let mut index = self.prefix.lock();
        let removed = index.delete(word)?;
        if removed {
            self.memo.lock().clear();
        }
        Ok(removed)
    }

    pub fn insert_point(
        &self,
        point: Point<T>,
    ) -> Result<(), SpatialError> {
        self.spatial.lock().insert(point)
    }

    pub fn remove_point(
        &self,
        point: &Point<T>,
    ) -> bool {
        self.spatial.lock().remove(point)
    }

    /// Последние поисковые строки, от самой свежей к самой старой.
    pub fn recent_searches(&self) -> Vec<String> {
        self.recent.lock().iter().map(|(s, _)| s.clone()).collect()
    }

    /// Количество слов и точек в индексах.
    pub fn sizes(&self) -> (usize, usize) {
        (self.prefix.lock().len(), self.spatial.lock().len())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для IndexBackend
////////////////////////////////////////////////////////////////////////////////

#[async_trait]
impl<T> QueryBackend<T> for IndexBackend<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn autocomplete(
        &self,
        prefix: &str,
        limit: usize,
        cancel: &CancelToken,
    ) -> SightlineResult<Vec<String>> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        self.recent.lock().put(prefix.to_string(), ());

        let key = (prefix.to_string(), limit);
        if let Some(words) = self.memo.lock().get(&key) {
            tracing::trace!(prefix, "Autocomplete served from cache");
            return Ok(words.clone());
        }

        let index = self.prefix.lock();
        let words = index.autocomplete(prefix, limit)?;
        self.memo.lock().put(key, words.clone());
        drop(index);

        Ok(words)
    }

    async fn range(
        &self,
        range: &Boundary,
        cancel: &CancelToken,
    ) -> SightlineResult<Vec<Point<T>>> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        // NaN и отрицательные размеры пустого ответа не дают: это ошибка
        // вызывающей стороны.
        if !(range.width >= 0.0 && range.height >= 0.0) {
            bail!(SpatialError::InvalidBoundary {
                reason: format!("query range {range:?} has negative or NaN size"),
            });
        }

        Ok(self
            .spatial
            .lock()
            .query(range)
            .into_iter()
            .cloned()
            .collect())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
