use std::fs;

use anyhow::{anyhow, Context, Result};
use tickler_core::config::{CONFIG_FILE_NAME, LOG_FILE_NAME};
use tickler_core::Settings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Logs go to `<data_dir>/tickler.log`; the terminal belongs to the UI.
/// Keep the guard alive until exit or buffered lines are lost.
pub fn init(settings: &Settings) -> Result<WorkerGuard> {
    let env_filter = filter(&settings.log_filter)?;

    fs::create_dir_all(&settings.data_dir)?;
    let appender = tracing_appender::rolling::never(&settings.data_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| anyhow!("could not install logger: {}", e))?;

    Ok(guard)
}

fn filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .with_context(|| format!("invalid `log_filter` in {}: '{}'", CONFIG_FILE_NAME, directives))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_levels_and_targets() {
        assert!(filter("info").is_ok());
        assert!(filter("tickler_core=debug,warn").is_ok());
    }

    #[test]
    fn test_bad_filter_is_reported_with_key() {
        let err = filter("tickler_core=loud").unwrap_err();
        assert!(format!("{:#}", err).contains("log_filter"));
    }
}
