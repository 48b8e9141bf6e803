//! Logging through `tracing`, rendered by `tracing-subscriber` on stderr.
//!
//! - `warn`: suspicious configuration, watcher failures
//! - `info`: build summaries
//! - `debug`: per-entry expansion and per-file scanning
//!
//! `RUST_LOG` overrides the level picked from the command line.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// `0` keeps the default, each step raises the level by one.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Installs the global subscriber. Returns `false` if one was already set,
/// which happens when the library is embedded in a host that logs itself.
pub fn init_logging(config: &LogConfig) -> bool {
    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.with_ansi)
                .with_target(false)
                .without_time(),
        )
        .try_init()
        .is_ok()
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,fluidsize={}",
            level.as_str().to_ascii_lowercase()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::LogConfig;
    use tracing::Level;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(LogConfig::from_verbosity(0).level, Level::INFO);
        assert_eq!(LogConfig::from_verbosity(1).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(4).level, Level::TRACE);
    }
}
