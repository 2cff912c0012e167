//! Graceful cancellation via atomic flag

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, LazyLock};

static FLAG: LazyLock<Arc<AtomicBool>> = LazyLock::new(|| Arc::new(AtomicBool::new(false)));

/// Process-wide shutdown flag, set by the SIGTERM/SIGINT handlers
pub fn shutdown_flag() -> Arc<AtomicBool> {
    Arc::clone(&FLAG)
}

/// Route SIGINT/SIGTERM into `flag`.
///
/// First signal sets the flag so the in-flight batch can resolve;
/// a second signal exits immediately with status 130.
pub fn install_signal_handlers(flag: &Arc<AtomicBool>) -> std::io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::flag;

    for signal in [SIGTERM, SIGINT] {
        // Registered first so it sees the flag before this signal sets it
        flag::register_conditional_shutdown(signal, 130, Arc::clone(flag))?;
        flag::register(signal, Arc::clone(flag))?;
    }
    Ok(())
}
