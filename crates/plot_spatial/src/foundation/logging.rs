//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Panics if a global logger has already been installed; use [`try_init`]
/// from tests or embedding applications that may initialize logging
/// themselves.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring an already-installed logger
pub fn try_init() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
