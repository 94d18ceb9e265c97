//! Per-call context derived from request metadata

use std::time::Duration;

use pcbook_core::CallContext;
use tonic::metadata::MetadataMap;
use tonic::Request;

/// Header carrying the client's remaining time budget
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// Taken off the client's budget so handlers give up before the transport's
/// own timer answers `Cancelled` on their behalf.
pub const DEADLINE_MARGIN: Duration = Duration::from_millis(10);

/// Parse a `grpc-timeout` value: up to eight ASCII digits followed by one of
/// `H M S m u n`.
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let timeout = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}

/// Build the context for one call. No (or an unreadable) timeout header means no deadline.
pub fn call_context(metadata: &MetadataMap) -> CallContext {
    metadata
        .get(GRPC_TIMEOUT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_grpc_timeout)
        .map(|timeout| CallContext::with_timeout(timeout.saturating_sub(DEADLINE_MARGIN)))
        .unwrap_or_default()
}

/// The context the server layer attached to `request`, or a fresh one from its metadata.
pub fn request_context<T>(request: &Request<T>) -> CallContext {
    request
        .extensions()
        .get::<CallContext>()
        .cloned()
        .unwrap_or_else(|| call_context(request.metadata()))
}
