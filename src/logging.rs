use chrono::Local;
use log::{LevelFilter, SetLoggerError};
use std::io::Write;

/// Installs the process logger.
///
/// `level` is the baseline filter; `RUST_LOG` directives are applied on top of it.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
}

/// Parses a level name from the CLI or config, falling back to `Info`.
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or_else(|_| {
        eprintln!("Unknown log level '{}', using info", name);
        LevelFilter::Info
    })
}
