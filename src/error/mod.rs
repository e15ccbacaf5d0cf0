//! Ошибки крейта.
//!
//! Доменные ошибки индексов и координатора живут в `sightline-error` и
//! реэкспортируются отсюда; сам крейт добавляет только ошибки настроек.

pub mod settings;

pub use settings::SettingsError;
pub use sightline_error::{
    CacheError, ErrorExt, PrefixError, QueryError, SightlineResult, SpatialError, StackError,
    StatusCode,
};
