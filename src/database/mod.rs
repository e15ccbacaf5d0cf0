//! Индексирующие структуры в памяти.
//!
//! # Модули
//!
//! - `lru`: LRU-кэш фиксированной ёмкости со сменной политикой вытеснения.
//! - `trie`: префиксный индекс для автодополнения.
//! - `quadtree`: квадродерево для запросов по области и радиусу.
//! - `safety`: макросы и ошибки проверки инвариантов.
//!
//! Все структуры однопоточные: разделять их между задачами нужно через
//! внешний мьютекс или передачу владения.

pub mod lru;
pub mod quadtree;
pub mod safety;
pub mod trie;

pub use lru::*;
pub use quadtree::*;
pub use safety::*;
pub use trie::*;
