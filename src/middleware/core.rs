use std::time::Duration;

use crate::error::DispatchError;

/// Result of one dispatch as seen by middleware and callers.
pub type DispatchOutcome = Result<Option<String>, DispatchError>;

/// Read-only view of a dispatch, handed to middleware hooks.
///
/// The request context is deliberately absent: it is mutably borrowed by the
/// endpoint for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub service_name: &'a str,
    pub correlation_id: Option<&'a str>,
    pub message: &'a str,
    pub has_context: bool,
}

/// Observer hooks around every dispatch.
///
/// Hooks run on the caller's thread, in registration order. They observe only:
/// they cannot short-circuit a dispatch or alter its outcome.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &DispatchRequest<'_>) {}
    fn after(&self, _req: &DispatchRequest<'_>, _outcome: &DispatchOutcome, _latency: Duration) {}
}
