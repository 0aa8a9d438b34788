//! Tracing and logging setup shared by the binaries.

pub mod logging;

pub use logging::{LOG_FORMAT_ENV, LogFormat};

/// Initialize process-wide logging.
///
/// The format comes from `FARMSTOCK_LOG_FORMAT` (JSON unless set to `pretty`),
/// the filter from `RUST_LOG` (default `info`). Safe to call multiple times;
/// subsequent calls are no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}
