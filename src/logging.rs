//! ftlog setup
//!
//! Host calls and the lifecycle driver log through the ftlog macros with a
//! `[wasm:{plugin}]` prefix. Nothing is printed until a logger is installed;
//! a harness that wants the output calls [`init`] once and keeps the guard.

use ftlog::LevelFilter;

use crate::wasm::LogConfig;

/// Parse a level name from the configuration
pub fn parse_level(level: &str) -> anyhow::Result<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::Trace),
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" => Ok(LevelFilter::Off),
        other => anyhow::bail!("Unknown log level: {}", other),
    }
}

/// Install the global ftlog logger.
///
/// Flushes on drop of the returned guard. Fails if a logger is already set.
pub fn init(config: &LogConfig) -> anyhow::Result<ftlog::LoggerGuard> {
    let level = parse_level(&config.level)?;
    ftlog::Builder::new()
        .max_log_level(level)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))
}
