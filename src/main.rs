//! `lineserv` — constant-time random-access line server.
//!
//! Startup sequence matches the state machine in spec.md §4's "State
//! machine (per process)" diagram: resolve config, ensure (or rebuild)
//! the index, then hand off to the supervisor, which forks workers that
//! each mmap the finalized index independently.
//!
//! Deliberately does **not** initialize `tracing` here: the master forks
//! worker processes later in [`lineserv::supervisor::run`], and forking a
//! process with a background log-flushing thread already running is
//! unsound (see that module's doc comment). Startup diagnostics before
//! the fork go straight to stderr, same as the fatal-error path in
//! `original_source/app.py`'s `create_app`, which `print()`s and exits
//! before Flask/gunicorn ever get control.

use lineserv::{config, index, pathsafety, supervisor};

fn main() {
    let opts = config::opts().run();

    match try_main(&opts) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("lineserv: fatal: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn try_main(opts: &config::Opts) -> Result<(), lineserv::Error> {
    let raw_path = config::data_path()?;
    let data_path = pathsafety::ensure_within_cwd(&raw_path)?;

    match index::is_fresh(&data_path)? {
        index::Freshness::Fresh { line_count } => {
            eprintln!(
                "lineserv: valid index found for {:?}, using it ({line_count} lines)",
                data_path
            );
        }
        index::Freshness::Stale => {
            eprintln!("lineserv: index missing or stale for {:?}, rebuilding...", data_path);
            let line_count = index::build_index(&data_path)?;
            eprintln!("lineserv: index built with {line_count} lines");
        }
    }

    supervisor::run(&data_path, opts.port, opts.workers, opts.quiet)?;
    Ok(())
}
