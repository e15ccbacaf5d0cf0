use tracing_subscriber::EnvFilter;

use crate::logging::config::LoggingConfig;

/// Собирает фильтр событий.
///
/// Порядок: `RUST_LOG`, если задан; иначе директива из конфигурации; если
/// и она не разбирается, `info`.
pub fn build_filter_from_config(config: &LoggingConfig) -> EnvFilter {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return env_filter;
    }

    let directive = config.build_filter_directive();
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter directive from config ('{directive}'): {e}; falling back to 'info'");
        EnvFilter::new("info")
    })
}
