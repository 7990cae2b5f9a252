//! Component K — the pre-fork supervisor.
//!
//! spec.md §1 names the process supervisor an external collaborator, but a
//! runnable crate still needs one; this keeps it small and grounds its
//! shape in `original_source/gunicorn_conf.py` (bind once, fork N workers,
//! `post_fork` in each child) while choosing the Rust-idiomatic primitive
//! for the fork itself.
//!
//! **Fork-safety note**: `libc::fork()` only duplicates the calling
//! thread — any other thread in the parent (for example a
//! `tracing-appender` non-blocking writer's background flush thread)
//! simply ceases to exist in the child, silently wedging anything that
//! depended on it. So the master forks *before* logging (component J) is
//! initialized anywhere, and initializes its own logging only after every
//! child has been spawned; each worker initializes its own logging
//! independently, immediately after the fork, before doing anything else.
//!
//! **Shutdown note**: each worker installs its own shutdown flag, fresh,
//! right after the fork — it does not rely on inheriting the master's. It
//! drives its accept loop with `tiny_http`'s `recv_timeout` rather than
//! the blocking `incoming_requests` iterator, checking the flag between
//! timeouts, the same `while !shutdown_flag.load(...) { match
//! server.recv_timeout(...) { ... } }` shape `raaymax-lazytail`'s own web
//! server uses (`src/web/mod.rs`). Without this, a `SIGTERM`'d worker
//! would only ever flip a flag nothing reads, and the master's `waitpid`
//! on it in [`supervise`] would hang forever.

use crate::http::serve_one;
use crate::{logging, worker};
use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use thiserror::Error;

/// How often a worker's accept loop wakes up to check its shutdown flag.
const SHUTDOWN_POLL_MS: u64 = 150;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to bind listen socket on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("fork() failed while spawning worker {worker}: {source}")]
    Fork {
        worker: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Binds the listen socket once, pre-forks `workers` children sharing it,
/// and runs the reap/respawn loop in the parent. Each child runs the HTTP
/// accept loop (component L) forever and never returns this function —
/// only the master (pid 0 return value from the loop) returns normally, on
/// clean shutdown.
pub fn run(data_path: &Path, port: u16, workers: usize, quiet: bool) -> Result<(), Error> {
    let listener = TcpListener::bind(("0.0.0.0", port)).map_err(|source| Error::Bind {
        port,
        source,
    })?;

    let shutdown = crate::signal::setup_shutdown_handlers().ok();

    let mut children = Vec::with_capacity(workers);
    for worker_id in 0..workers.max(1) {
        // SAFETY: no other thread has been spawned in this process yet —
        // logging, in particular, is initialized strictly after this loop
        // finishes, in both branches.
        let pid = unsafe { libc::fork() };
        match pid {
            -1 => {
                return Err(Error::Fork {
                    worker: worker_id,
                    source: std::io::Error::last_os_error(),
                })
            }
            0 => {
                // Child: re-initialize logging fresh in this process, then
                // serve until either a fatal bootstrap failure or a
                // shutdown signal ends `run_worker`'s loop.
                let data_path = data_path.to_path_buf();
                let code = run_worker(&listener, &data_path, quiet);
                std::process::exit(code);
            }
            child_pid => children.push(child_pid),
        }
    }

    // Parent: own logging, then supervise.
    let _log_guards = logging::init(quiet).ok();
    tracing::info!(target: "server", workers = children.len(), port, "supervisor started");
    supervise(children, shutdown, &listener, data_path, port, quiet)
}

/// Runs the HTTP accept loop for one worker, returning the process exit
/// code it should terminate with: `0` on a clean shutdown-flag-driven
/// exit, `1` if bootstrap or the server itself fails.
fn run_worker(listener: &TcpListener, data_path: &Path, quiet: bool) -> i32 {
    let _log_guards = logging::init(quiet).ok();
    let shutdown = crate::signal::setup_shutdown_handlers().ok();

    let ctx = match worker::bootstrap(data_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(target: "server", error = %e, "worker bootstrap failed");
            return 1;
        }
    };

    let listener_clone = match listener.try_clone() {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "server", error = %e, "worker failed to clone listener");
            return 1;
        }
    };

    let server = match tiny_http::Server::from_listener(listener_clone, None) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(target: "server", error = %e, "worker failed to start HTTP server");
            return 1;
        }
    };

    tracing::info!(target: "server", pid = std::process::id(), "worker serving requests");
    while !shutdown.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
        match server.recv_timeout(Duration::from_millis(SHUTDOWN_POLL_MS)) {
            Ok(Some(request)) => serve_one(&ctx, request),
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(target: "server", error = %e, "worker accept failed");
                return 1;
            }
        }
    }
    tracing::info!(target: "server", pid = std::process::id(), "worker shutting down");
    0
}

fn supervise(
    mut children: Vec<i32>,
    shutdown: Option<std::sync::Arc<std::sync::atomic::AtomicBool>>,
    listener: &TcpListener,
    data_path: &Path,
    _port: u16,
    quiet: bool,
) -> Result<(), Error> {
    loop {
        if shutdown.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
            tracing::info!(target: "server", "shutdown requested, terminating workers");
            for &pid in &children {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
            }
            for &pid in &children {
                let mut status = 0;
                unsafe {
                    libc::waitpid(pid, &mut status, 0);
                }
            }
            return Ok(());
        }

        let mut status = 0;
        let reaped = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
        if reaped > 0 {
            if let Some(pos) = children.iter().position(|&p| p == reaped) {
                children.remove(pos);
                tracing::warn!(target: "server", pid = reaped, "worker exited unexpectedly, respawning");
                match respawn(listener, data_path, quiet) {
                    Ok(new_pid) => children.push(new_pid),
                    Err(e) => tracing::error!(target: "server", error = %e, "failed to respawn worker"),
                }
            }
        }
        std::thread::sleep(Duration::from_millis(200));
    }
}

fn respawn(listener: &TcpListener, data_path: &Path, quiet: bool) -> Result<i32, Error> {
    let pid = unsafe { libc::fork() };
    match pid {
        -1 => Err(Error::Fork {
            worker: 0,
            source: std::io::Error::last_os_error(),
        }),
        0 => {
            let data_path = data_path.to_path_buf();
            let code = run_worker(listener, &data_path, quiet);
            std::process::exit(code);
        }
        child_pid => Ok(child_pid),
    }
}
