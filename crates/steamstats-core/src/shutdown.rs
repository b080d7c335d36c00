//! Graceful shutdown: SIGINT/SIGTERM set a flag checked between identifiers

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide flag, set by the signal handlers
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::Relaxed);
}

/// Install SIGINT/SIGTERM handlers.
///
/// First signal: request a graceful stop (records written so far are
/// flushed). Second signal: exit immediately with 130.
pub fn install_signal_handlers() -> std::io::Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
        unsafe {
            signal_hook::low_level::register(signal, || {
                if shutdown_flag().swap(true, Ordering::Relaxed) {
                    std::process::exit(130);
                }
            })?;
        }
    }
    Ok(())
}
