use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::{DispatchOutcome, DispatchRequest, Middleware};
use crate::error::DispatchError;

/// Emits structured `tracing` events for every dispatch.
///
/// - `before`: debug event with service name and correlation id
/// - `after`: info on success, warn on broker-level failures, error on
///   endpoint failures (with the cause chain)
///
/// Message bodies are never logged; only their length is recorded.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &DispatchRequest<'_>) {
        debug!(
            service_name = %req.service_name,
            correlation_id = req.correlation_id.unwrap_or("-"),
            message_len = req.message.len(),
            has_context = req.has_context,
            "Dispatch start"
        );
    }

    fn after(&self, req: &DispatchRequest<'_>, outcome: &DispatchOutcome, latency: Duration) {
        let latency_us = latency.as_micros() as u64;
        let correlation_id = req.correlation_id.unwrap_or("-");
        match outcome {
            Ok(result) => {
                info!(
                    service_name = %req.service_name,
                    correlation_id,
                    latency_us,
                    has_result = result.is_some(),
                    "Dispatch complete"
                );
            }
            Err(DispatchError::ProcessorFailure(err)) => {
                error!(
                    service_name = %req.service_name,
                    correlation_id,
                    latency_us,
                    cause = %format!("{:#}", err.cause()),
                    "Request processor failed"
                );
            }
            Err(err) => {
                warn!(
                    service_name = %req.service_name,
                    correlation_id,
                    latency_us,
                    error_kind = err.kind(),
                    error = %err,
                    "Dispatch rejected"
                );
            }
        }
    }
}
