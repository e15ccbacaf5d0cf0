//! LRU-кэш фиксированной ёмкости.
//!
//! # Модули
//!
//! - `lru_base`: сам кэш, арена записей и индекс по ключу.
//! - `policy`: трейт `EvictionPolicy` и реализация `LruPolicy` на
//!   двусвязном списке индексов.

pub mod lru_base;
pub mod policy;

pub use lru_base::*;
pub use policy::*;
