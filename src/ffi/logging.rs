// In: src/ffi/logging.rs

//! Opt-in log output for hosts that load the shared library.
//!
//! The crate only emits through the `log` facade. Nothing is printed until a host
//! calls `EnableVerboseLogging` (or a Rust caller calls
//! [`enable_verbose_logging`]), which installs `env_logger` exactly once.

use std::ffi::{c_char, CStr};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Installs the process-wide logger at `Trace` level, writing `[LEVEL] message`
/// lines to stderr or, when given, appending them to `log_file`.
///
/// Only the first call has an effect. If the file cannot be opened the logger
/// falls back to stderr and says so.
pub fn enable_verbose_logging(log_file: Option<&Path>) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Trace);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        let mut open_failure = None;
        if let Some(path) = log_file {
            match OpenOptions::new().append(true).create(true).open(path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(err) => open_failure = Some((path.to_path_buf(), err)),
            }
        }

        let _ = builder.try_init();

        if let Some((path, err)) = open_failure {
            log::warn!("could not open log file {}: {}", path.display(), err);
        }
    });
}

/// Switches on log output. `log_file` is a nullable NUL-terminated path.
///
/// # Safety
/// `log_file` must be null or point to a valid NUL-terminated string.
#[export_name = "EnableVerboseLogging"]
pub unsafe extern "C" fn enable_verbose_logging_c(log_file: *const c_char) {
    let path = if log_file.is_null() {
        None
    } else {
        CStr::from_ptr(log_file).to_str().ok().map(Path::new)
    };
    enable_verbose_logging(path);
}
