//! Component G — the request handler, and its `tiny_http` transport glue.
//!
//! [`route`] is deliberately transport-agnostic — it takes a method and
//! path and returns a status/content-type/body triple — so it can be
//! exercised in tests without opening a socket. [`serve_one`] adapts a
//! `tiny_http::Request` to it, the same split lazytail's `web::mod.rs`
//! draws between `handle_request` (transport) and its response-building
//! helpers (`respond_plain`, `respond_json`, ...).

use crate::index::IndexHandle;
use crate::reader::{LineReader, LineResult};
use std::sync::atomic::{AtomicU64, Ordering};
use tiny_http::{Header, Method, Response, StatusCode};
use tracing::{info, warn};

/// Everything a worker needs to answer requests: the immutable index
/// mapping, the per-worker data file descriptor, and the data file size
/// captured at bootstrap (spec.md §3's "per-process index handle").
pub struct ServingContext {
    pub index: IndexHandle,
    pub reader: LineReader,
    pub data_size: AtomicU64,
}

pub struct RouteOutcome {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl RouteOutcome {
    fn text(status: u16, body: &str) -> RouteOutcome {
        RouteOutcome {
            status,
            content_type: "text/plain",
            body: body.as_bytes().to_vec(),
        }
    }
}

/// `GET /lines/{n}` and the 404 fallback for everything else.
///
/// Parsing and validation order follows spec.md §4.G exactly:
/// 1. parse `{n}` as a non-negative integer → `400` on failure;
/// 2. bound-check against `total_lines` → `413` if out of range;
/// 3. read the line → `500` on I/O failure;
/// 4. anything else → `404`.
///
/// `{n}` must consist only of ASCII digits, matching the ground-truth
/// original's `line_number.isdigit()` check (`original_source/app.py`):
/// unsigned `u64::from_str` alone would also accept a leading `+`, which
/// the original always rejects with `400`. A digit-only token too long
/// to fit `u64` is treated as out-of-range rather than malformed — the
/// original's arbitrary-precision `int()` would just compare `>=
/// len(line_offsets)` and return `413`, never `400`, for such a token.
pub fn route(ctx: &ServingContext, method: &Method, path: &str) -> RouteOutcome {
    let Some(rest) = (if *method == Method::Get {
        path.strip_prefix("/lines/")
    } else {
        None
    }) else {
        return RouteOutcome::text(404, "Not Found\n");
    };

    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return RouteOutcome::text(400, "Invalid line index. Must be a positive integer.\n");
    }

    let n: u64 = match rest.parse() {
        Ok(n) => n,
        Err(_) => {
            // Only possible parse error left for an all-digit, non-empty
            // token is overflow — a line number that large is certainly
            // beyond the end of the file.
            return RouteOutcome::text(413, "Requested line is beyond the end of the file.\n");
        }
    };

    let data_size = ctx.data_size.load(Ordering::Relaxed);
    match ctx.reader.read_line(&ctx.index, data_size, n) {
        Ok(LineResult::Ok(body)) => RouteOutcome {
            status: 200,
            content_type: "text/plain",
            body,
        },
        Ok(LineResult::OutOfRange) => {
            RouteOutcome::text(413, "Requested line is beyond the end of the file.\n")
        }
        Err(e) => {
            warn!(target: "server", error = %e, line = n, "failed to read line");
            RouteOutcome::text(500, "Internal server error")
        }
    }
}

/// Serves one `tiny_http::Request` against `ctx`, logging an access-log
/// event for it.
pub fn serve_one(ctx: &ServingContext, request: tiny_http::Request) {
    let path = request.url().to_string();
    let method = request.method().clone();
    let client = request
        .remote_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());

    let outcome = route(ctx, &method, &path);

    info!(
        target: "access",
        client = %client,
        method = %method,
        path = %path,
        status = outcome.status,
        body_len = outcome.body.len(),
        "request served"
    );

    let mut response = Response::from_data(outcome.body).with_status_code(StatusCode(outcome.status));
    if let Ok(header) = Header::from_bytes("Content-Type", outcome.content_type) {
        response = response.with_header(header);
    }
    let _ = request.respond(response);
}
