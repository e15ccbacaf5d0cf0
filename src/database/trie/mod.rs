//! Префиксный индекс (trie) для автодополнения.
//!
//! # Модули
//!
//! - `trie_base`: `PrefixIndex` и узлы дерева.
//! - `alphabet`: допустимый алфавит и нормализация регистра.

pub mod alphabet;
pub mod trie_base;

pub use alphabet::*;
pub use trie_base::*;
