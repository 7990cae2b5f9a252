//! Component J — structured logging.
//!
//! Two independent sinks layered on one `tracing_subscriber::registry()`,
//! generalizing the single-stream `log_init` tailsrv itself sketches in
//! `src/lib.rs`:
//!
//! - the **server log** (startup, rebuild, fatal errors) goes to both
//!   stderr and `logs/server.log`;
//! - the **access log** (one event per request) goes only to
//!   `logs/access.log`, selected by `target == "access"` and excluded from
//!   the server-log layer by the complementary filter.
//!
//! `logs/` is created on demand, mirroring every version of
//! `original_source/app.py`'s `os.makedirs("logs", exist_ok=True)`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{filter::filter_fn, fmt, prelude::*, EnvFilter};

/// Guards for the non-blocking file writers. Must be held for the
/// process's lifetime — dropping them stops flushing to disk.
pub struct LogGuards {
    _server: WorkerGuard,
    _access: WorkerGuard,
}

/// Initializes logging. `quiet` raises the server log's default level
/// from `INFO` to `WARN`, matching tailsrv's own `-q` flag.
pub fn init(quiet: bool) -> std::io::Result<LogGuards> {
    std::fs::create_dir_all("logs")?;

    let server_file = tracing_appender::rolling::never("logs", "server.log");
    let (server_writer, server_guard) = tracing_appender::non_blocking(server_file);

    let access_file = tracing_appender::rolling::never("logs", "access.log");
    let (access_writer, access_guard) = tracing_appender::non_blocking(access_file);

    let default_level = if quiet { "warn" } else { "info" };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.parse().unwrap())
        .from_env_lossy();

    let is_access = |meta: &tracing::Metadata<'_>| meta.target() == "access";

    let server_layer = fmt::layer()
        .with_writer(std::io::stderr.and(server_writer))
        .with_filter(env_filter)
        .with_filter(filter_fn(move |meta| !is_access(meta)));

    let access_layer = fmt::layer()
        .with_writer(access_writer)
        .without_time()
        .with_target(false)
        .with_filter(filter_fn(is_access));

    tracing_subscriber::registry()
        .with(server_layer)
        .with(access_layer)
        .init();

    Ok(LogGuards {
        _server: server_guard,
        _access: access_guard,
    })
}
