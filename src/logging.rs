//! Plugin log output.
//!
//! Lines go to `counterspy.log` under the platform config directory
//! (`%APPDATA%/counterspy` on Windows) and to stdout. Set
//! `COUNTERSPY_DEBUG=1` to get debug events from the plugin crates.

use std::io;
use std::path::{Path, PathBuf};

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEBUG_ENV: &str = "COUNTERSPY_DEBUG";
const LOG_FILE: &str = "counterspy.log";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Install the global subscriber.
///
/// Hold the returned guard until the plugin unloads, otherwise buffered
/// file lines are lost.
///
/// # Behavior
/// - **File:** `counterspy.log`, rotated at 10 MB into a single
///   `counterspy.log.1`, no ANSI colors
/// - **Stdout:** same events, same filter
/// - **Filter:** `info` everywhere; `debug` for `counterspy` and
///   `counterspy_core` when `COUNTERSPY_DEBUG` is set
/// - **Reload:** if the host already installed a subscriber, it is kept and
///   this plugin's events go there
///
/// # Fallback
/// When there is no config directory, or the directory or file can't be
/// created, logs go to stdout only and `None` is returned.
pub fn init() -> Option<WorkerGuard> {
    let debug_logging = std::env::var_os(DEBUG_ENV).is_some();

    let (file_writer, guard, log_path) = match open_log_file() {
        Ok((appender, path)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard), Some(path))
        }
        Err(e) => {
            // No subscriber yet
            eprintln!("CounterSpy file logging unavailable ({e}), using stdout only");
            (None, None, None)
        }
    };

    let installed = install(file_writer, debug_logging);
    tracing::info!(
        log_file = ?log_path,
        debug_logging,
        installed,
        "CounterSpy logging initialized"
    );

    guard
}

fn open_log_file() -> io::Result<(BasicRollingFileAppender, PathBuf)> {
    let dir = dirs::config_dir()
        .map(|config| config.join("counterspy"))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no config directory"))?;
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(LOG_FILE);
    let appender = rolling_appender(&path)?;
    Ok((appender, path))
}

fn rolling_appender(path: &Path) -> io::Result<BasicRollingFileAppender> {
    BasicRollingFileAppender::new(
        path,
        RollingConditionBasic::new().max_size(MAX_LOG_BYTES),
        1,
    )
}

/// Returns false when another global subscriber was already set.
fn install(file_writer: Option<NonBlocking>, debug_logging: bool) -> bool {
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
    });

    let stdout_layer = fmt::layer()
        .with_writer(io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .with(EnvFilter::new(filter_directive(debug_logging)))
        .try_init()
        .is_ok()
}

fn filter_directive(debug_logging: bool) -> &'static str {
    if debug_logging {
        "info,counterspy=debug,counterspy_core=debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_directive_only_raises_plugin_crates() {
        assert_eq!(filter_directive(false), "info");
        let debug = filter_directive(true);
        assert!(debug.starts_with("info,"));
        assert!(debug.contains("counterspy_core=debug"));
        assert!(debug.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn appender_creates_log_file() {
        let dir = std::env::temp_dir().join(format!("counterspy-log-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(LOG_FILE);

        rolling_appender(&path).unwrap();
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
