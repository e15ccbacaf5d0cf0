use std::{borrow::Borrow, fmt::Debug, hash::Hash, marker::PhantomData};

use ahash::AHashMap;
use sightline_error::CacheError;

use super::{EvictionPolicy, LruPolicy};
use crate::{database::ValidationError, debug_assert_invariant, validate};

/// Запись кэша: ключ и значение. Принадлежит только кэшу.
#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Кэш фиксированной ёмкости с вытеснением по политике `P`.
///
/// **ИНВАРИАНТЫ:**
///
/// - `map.len() == policy.len() <= capacity`
/// - каждый занятый слот арены ровно один раз учтён в `map` и в политике
/// - свободные слоты перечислены в `free` и пусты
///
/// `get`, `put` и `remove` выполняются за O(1): поиск идёт через хеш-таблицу,
/// порядок давности меняется перестановкой индексов в политике.
///
/// Кэш не обращается к источнику данных: при промахе вызывающая сторона
/// сама кладёт значение через `put`.
#[derive(Debug, Clone)]
pub struct LruCache<K, V, P = LruPolicy> {
    map: AHashMap<K, usize>,
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    policy: P,
    capacity: usize,
}

/// Итератор по записям от самой свежей к самой старой.
pub struct Iter<'a, K, V, P> {
    cache: &'a LruCache<K, V, P>,
    current: Option<usize>,
    _marker: PhantomData<&'a Entry<K, V>>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl<K, V> LruCache<K, V, LruPolicy>
where
    K: Hash + Eq + Clone,
{
    /// Создаёт кэш с политикой LRU. Ёмкость должна быть не меньше 1.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::with_policy(capacity, LruPolicy::new())
    }
}

impl<K, V, P> LruCache<K, V, P>
where
    K: Hash + Eq + Clone,
    P: EvictionPolicy,
{
    /// Создаёт кэш с переданной политикой вытеснения.
    pub fn with_policy(
        capacity: usize,
        policy: P,
    ) -> Result<Self, CacheError> {
        if capacity < 1 {
            return Err(CacheError::InvalidCapacity { capacity });
        }

        Ok(Self {
            map: AHashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            policy,
            capacity,
        })
    }

    /// Возвращает значение и делает запись самой свежей.
    ///
    /// Отсутствие ключа: обычный промах, не ошибка.
    pub fn get<Q>(
        &mut self,
        key: &Q,
    ) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.map.get(key)?;
        self.policy.touch(slot);
        self.slots[slot].as_ref().map(|e| &e.value)
    }

    /// Как `get`, но возвращает изменяемую ссылку.
    pub fn get_mut<Q>(
        &mut self,
        key: &Q,
    ) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.map.get(key)?;
        self.policy.touch(slot);
        self.slots[slot].as_mut().map(|e| &mut e.value)
    }

    /// Возвращает значение без изменения порядка давности.
    pub fn peek<Q>(
        &self,
        key: &Q,
    ) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.map.get(key)?;
        self.slots[slot].as_ref().map(|e| &e.value)
    }

    /// Проверяет наличие ключа без изменения порядка давности.
    pub fn contains<Q>(
        &self,
        key: &Q,
    ) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Вставляет или обновляет запись и делает её самой свежей.
    ///
    /// Если новая запись не помещается, сначала вытесняется самая старая;
    /// она и возвращается.
    pub fn put(
        &mut self,
        key: K,
        value: V,
    ) -> Option<(K, V)> {
        if let Some(&slot) = self.map.get(&key) {
            if let Some(entry) = self.slots[slot].as_mut() {
                entry.value = value;
            }
            self.policy.touch(slot);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let slot = self.allocate(Entry {
            key: key.clone(),
            value,
        });
        self.map.insert(key, slot);
        self.policy.insert(slot);

        debug_assert_invariant!(
            self.map.len() <= self.capacity,
            "{} entries in a cache of capacity {}",
            self.map.len(),
            self.capacity
        );

        evicted
    }

    /// Удаляет запись. Для отсутствующего ключа ничего не делает.
    pub fn remove<Q>(
        &mut self,
        key: &Q,
    ) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.map.remove(key)?;
        self.policy.remove(slot);
        self.release(slot).map(|e| e.value)
    }

    /// Текущее число записей.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Ёмкость, заданная при создании.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Удаляет все записи. Ёмкость сохраняется.
    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.policy.clear();
    }

    /// Итератор по `(&K, &V)` от самой свежей записи к самой старой.
    pub fn iter(&self) -> Iter<'_, K, V, P> {
        Iter {
            cache: self,
            current: self.policy.most_recent(),
            _marker: PhantomData,
        }
    }

    /// Проверяет согласованность арены, хеш-таблицы и политики.
    pub fn validate_invariants(&self) -> Result<(), ValidationError>
    where
        K: Debug,
    {
        validate!(
            self.map.len() <= self.capacity,
            ValidationError::CapacityExceeded {
                capacity: self.capacity,
                actual: self.map.len()
            }
        );

        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        validate!(
            occupied == self.map.len(),
            ValidationError::LengthMismatch {
                expected: self.map.len(),
                actual: occupied
            }
        );

        let mut walked = 0;
        for (key, _) in self.iter() {
            walked += 1;
            validate!(
                walked <= self.map.len(),
                ValidationError::OrderMismatch {
                    message: "recency list is longer than the key index".to_string()
                }
            );
            validate!(
                self.map.contains_key(key),
                ValidationError::OrderMismatch {
                    message: format!("{key:?} is ordered but not indexed")
                }
            );
        }

        validate!(
            walked == self.map.len(),
            ValidationError::LengthMismatch {
                expected: self.map.len(),
                actual: walked
            }
        );

        Ok(())
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let slot = self.policy.victim()?;
        self.policy.remove(slot);
        let entry = self.release(slot)?;
        self.map.remove(&entry.key);

        tracing::trace!(slot, capacity = self.capacity, "LRU entry evicted");

        Some((entry.key, entry.value))
    }

    fn allocate(
        &mut self,
        entry: Entry<K, V>,
    ) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    fn release(
        &mut self,
        slot: usize,
    ) -> Option<Entry<K, V>> {
        let entry = self.slots.get_mut(slot)?.take();
        if entry.is_some() {
            self.free.push(slot);
        }
        entry
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для LruCache
////////////////////////////////////////////////////////////////////////////////

impl<'a, K, V, P> Iterator for Iter<'a, K, V, P>
where
    P: EvictionPolicy,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.current?;
        self.current = self.cache.policy.next_older(slot);

        self.cache.slots[slot]
            .as_ref()
            .map(|entry| (&entry.key, &entry.value))
    }
}

impl<'a, K, V, P> IntoIterator for &'a LruCache<K, V, P>
where
    K: Hash + Eq + Clone,
    P: EvictionPolicy,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
