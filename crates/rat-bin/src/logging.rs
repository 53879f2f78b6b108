//! Logging and panic-hook setup, run once at startup before the terminal
//! enters raw mode.

use std::path::Path;
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;

/// Installs a file-backed `tracing` subscriber and returns the worker guard
/// that must stay alive for writes to actually flush. Returns `None` if a
/// subscriber is already installed (e.g. under a test harness), which is not
/// treated as an error.
pub fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("rat.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "rat.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        Err(_err) => None,
    }
}

/// Logs panics through `tracing` before delegating to the previously
/// installed hook, so a crash mid-session still lands in `rat.log` even
/// though the alternate screen swallows the printed backtrace.
pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}
