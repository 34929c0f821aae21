//! Built-in demonstration endpoints used by the command-line tool.

use crate::context::RequestContext;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::processor::RequestProcessor;
use std::fmt;
use std::sync::Arc;

/// Returns the message unchanged and records the correlation id in the context.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoProcessor;

impl RequestProcessor for EchoProcessor {
    fn handle(
        &self,
        correlation_id: Option<&str>,
        message: &str,
        context: Option<&mut RequestContext>,
    ) -> anyhow::Result<Option<String>> {
        if let (Some(ctx), Some(cid)) = (context, correlation_id) {
            ctx.insert("echo.correlation_id", cid.to_owned());
        }
        Ok(Some(message.to_string()))
    }
}

/// Upper-cases the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct UppercaseProcessor;

impl RequestProcessor for UppercaseProcessor {
    fn handle(
        &self,
        _correlation_id: Option<&str>,
        message: &str,
        _context: Option<&mut RequestContext>,
    ) -> anyhow::Result<Option<String>> {
        Ok(Some(message.to_uppercase()))
    }
}

/// Failure raised by [`FailingProcessor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedMessage {
    pub message: String,
}

impl fmt::Display for RejectedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message rejected: {}", self.message)
    }
}

impl std::error::Error for RejectedMessage {}

/// Always fails; shows how endpoint failures surface through the dispatcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingProcessor;

impl RequestProcessor for FailingProcessor {
    fn handle(
        &self,
        _correlation_id: Option<&str>,
        message: &str,
        _context: Option<&mut RequestContext>,
    ) -> anyhow::Result<Option<String>> {
        Err(RejectedMessage {
            message: message.to_string(),
        }
        .into())
    }
}

/// Register `echo`, `upper` and `fail`.
///
/// # Errors
///
/// `DuplicateName` if any of the names is already bound under the reject
/// policy.
pub fn register_builtin(dispatcher: &Dispatcher) -> Result<(), DispatchError> {
    dispatcher.register("echo", Arc::new(EchoProcessor))?;
    dispatcher.register("upper", Arc::new(UppercaseProcessor))?;
    dispatcher.register("fail", Arc::new(FailingProcessor))?;
    Ok(())
}
