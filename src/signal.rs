//! Flag-based shutdown signal handling, shared by the master and each
//! worker. A direct generalization of `signal-hook`'s flag recipe; a
//! second `SIGTERM`/`SIGINT` while shutdown is already in progress forces
//! an immediate exit rather than waiting for an in-flight request or
//! child reap to finish.

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Registers handlers for `SIGTERM`/`SIGINT` that flip the returned flag to
/// `true`. A second signal after the flag is already set force-exits with
/// code 1.
pub fn setup_shutdown_handlers() -> Result<Arc<AtomicBool>, std::io::Error> {
    let term_now = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(&term_now))?;
        flag::register(*sig, Arc::clone(&term_now))?;
    }
    Ok(term_now)
}
