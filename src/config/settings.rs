use std::path::Path;

use ::config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use super::{CacheConfig, PrefixConfig, QueryConfig, SpatialConfig};
use crate::{error::SettingsError, logging::LoggingConfig};

/// Префикс переменных окружения: `SIGHTLINE_QUERY__DEBOUNCE_MS=150`.
const ENV_PREFIX: &str = "SIGHTLINE";

/// Все настройки крейта.
///
/// Источники по возрастанию приоритета: значения по умолчанию, файл,
/// переменные окружения с префиксом `SIGHTLINE_` (вложенность через `__`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cache: CacheConfig,
    pub prefix: PrefixConfig,
    pub spatial: SpatialConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки из необязательного файла `sightline.*` в текущем
    /// каталоге и из окружения.
    pub fn load() -> Result<Self, SettingsError> {
        let builder = Config::builder().add_source(File::with_name("sightline").required(false));
        Self::from_builder(builder, Self::environment())
    }

    /// Как [`Settings::load`], но файл указан явно и обязан существовать.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let builder = Config::builder().add_source(File::from(path.as_ref()).required(true));
        Self::from_builder(builder, Self::environment())
    }

    /// Проверяет каждый раздел.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.cache.validate()?;
        self.prefix.alphabet.validate()?;
        self.spatial.validate()?;
        self.query.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        env: Environment,
    ) -> Result<Self, SettingsError> {
        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;

        tracing::debug!(
            cache_capacity = settings.cache.capacity,
            debounce_ms = settings.query.debounce_ms,
            node_capacity = settings.spatial.node_capacity,
            "Settings loaded"
        );

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use ::config::{FileFormat, Map};

    use super::*;
    use crate::{
        database::{Boundary, CharSet},
        logging::LogFormat,
    };

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::environment().source(Some(map))
    }

    fn from_toml(
        toml: &str,
        vars: &[(&str, &str)],
    ) -> Result<Settings, SettingsError> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Settings::from_builder(builder, env(vars))
    }

    #[test]
    fn test_empty_sources_give_defaults() {
        let settings = from_toml("", &[]).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_values() {
        let settings = from_toml(
            r#"
            [cache]
            capacity = 32

            [prefix]
            case_sensitive = false
            alphabet = "ascii_letters"

            [spatial]
            node_capacity = 8
            root_boundary = { x = -180.0, y = -90.0, width = 360.0, height = 180.0 }

            [logging]
            format = "json"
            "#,
            &[],
        )
        .unwrap();

        assert_eq!(settings.cache.capacity, 32);
        assert!(!settings.prefix.case_sensitive);
        assert_eq!(settings.prefix.alphabet, CharSet::AsciiLetters);
        assert_eq!(settings.spatial.node_capacity, 8);
        assert_eq!(
            settings.spatial.root_boundary,
            Boundary::new(-180.0, -90.0, 360.0, 180.0)
        );
        assert_eq!(settings.spatial.max_depth, 16);
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_environment_overrides_file() {
        let settings = from_toml(
            "[query]\ndebounce_ms = 500\n",
            &[
                ("SIGHTLINE_QUERY__DEBOUNCE_MS", "150"),
                ("SIGHTLINE_QUERY__DISTINCT", "false"),
            ],
        )
        .unwrap();

        assert_eq!(settings.query.debounce_ms, 150);
        assert!(!settings.query.distinct);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = from_toml("[cache]\ncapacity = 0\n", &[]).unwrap_err();
        assert!(matches!(err, SettingsError::Cache(_)));

        let err = from_toml(
            "[spatial.root_boundary]\nx = 0.0\ny = 0.0\nwidth = 0.0\nheight = 1.0\n",
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, SettingsError::Spatial(_)));

        let err = from_toml("[prefix]\nalphabet = { custom = \"\" }\n", &[]).unwrap_err();
        assert!(matches!(err, SettingsError::Prefix(_)));

        let err = from_toml("[logging]\nlevel = \"chatty\"\n", &[]).unwrap_err();
        assert!(matches!(err, SettingsError::Logging { .. }));
    }

    #[test]
    fn test_missing_required_file() {
        let err = Settings::load_from("/definitely/not/here/sightline.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }
}
