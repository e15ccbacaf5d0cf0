use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Уровни, которые принимает `level`.
const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Формат вывода событий.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: `trace`, `debug`, `info`, `warn`, `error`, `off`.
    pub level: String,
    pub format: LogFormat,
    /// Дополнительные директивы `EnvFilter`, например
    /// `sightline::query=trace`.
    pub directives: Vec<String>,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl LoggingConfig {
    /// Применяет `SIGHTLINE_LOG_LEVEL` и `SIGHTLINE_LOG_FORMAT`, если они
    /// заданы. Неизвестный формат игнорируется.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SIGHTLINE_LOG_LEVEL") {
            self.level = level.trim().to_lowercase();
        }

        if let Ok(format) = std::env::var("SIGHTLINE_LOG_FORMAT") {
            match format.trim().to_lowercase().as_str() {
                "pretty" => self.format = LogFormat::Pretty,
                "compact" => self.format = LogFormat::Compact,
                "json" => self.format = LogFormat::Json,
                other => tracing::warn!(format = other, "Unknown log format ignored"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(SettingsError::Logging {
                reason: format!("unknown level '{}'", self.level),
            });
        }

        for directive in &self.directives {
            if let Err(e) = tracing_subscriber::EnvFilter::try_new(directive) {
                return Err(SettingsError::Logging {
                    reason: format!("bad directive '{directive}': {e}"),
                });
            }
        }

        Ok(())
    }

    /// Строка для `EnvFilter`: базовый уровень и дополнительные директивы
    /// через запятую.
    pub fn build_filter_directive(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directives: Vec::new(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
