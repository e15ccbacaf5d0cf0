//! Настройки: параметры каждой структуры и их загрузка.
//!
//! # Модули
//!
//! - `index`: параметры кэша, индексов и координатора.
//! - `settings`: `Settings` и загрузка через крейт `config`.

pub mod index;
pub mod settings;

pub use index::*;
pub use settings::Settings;
