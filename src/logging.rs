use env_logger::WriteStyle;
use log::LevelFilter;
use std::io::Write;

/// Installs a global logger for the collision core.
///
/// The default level is `Warn` so per-query tracing stays quiet unless
/// `RUST_LOG` asks for it. Calling this more than once returns the error
/// from the second installation attempt, which callers are free to ignore.
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "[CONVEX | {}] {}", record.level(), record.args()))
        .write_style(WriteStyle::Always)
        .filter(None, LevelFilter::Warn)
        .parse_default_env()
        .try_init()
}
