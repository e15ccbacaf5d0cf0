//! Логирование через `tracing-subscriber`.
//!
//! # Модули
//!
//! - `config`: `LoggingConfig` и формат вывода.
//! - `filters`: сборка `EnvFilter`.
//! - `formatter`: слой вывода в выбранном формате.

pub mod config;
mod filters;
mod formatter;

pub use self::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::SettingsError;

/// Устанавливает глобальный subscriber.
///
/// Повторный вызов в том же процессе возвращает
/// [`SettingsError::Subscriber`].
pub fn init_logging(mut config: LoggingConfig) -> Result<(), SettingsError> {
    config.apply_env_overrides();
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config);
    let layer = formatter::build_formatter_from_config(&config);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = option_env!("SIGHTLINE_GIT_COMMIT").unwrap_or("unknown"),
        built = option_env!("SIGHTLINE_BUILD_TIME").unwrap_or("unknown"),
        log_level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}
