//! The endpoint capability: anything that can process a request by name.

use crate::context::RequestContext;
use std::fmt;

/// A named unit of request-processing logic.
///
/// Implementations receive the optional correlation id, the message, and the
/// optional caller-owned context. Any failure may be returned; the dispatcher
/// wraps it without inspecting it.
///
/// Returning `Ok(None)` is a legitimate "no result" and is forwarded to the
/// caller as-is, distinct from `Ok(Some(String::new()))`.
///
/// Endpoints run on the caller's thread and may be invoked concurrently, hence
/// `Send + Sync`.
pub trait RequestProcessor: Send + Sync {
    fn handle(
        &self,
        correlation_id: Option<&str>,
        message: &str,
        context: Option<&mut RequestContext>,
    ) -> anyhow::Result<Option<String>>;
}

/// Adapter that turns a closure into a [`RequestProcessor`].
///
/// Build one with [`processor_fn`].
pub struct FnProcessor<F> {
    f: F,
}

impl<F> RequestProcessor for FnProcessor<F>
where
    F: Fn(Option<&str>, &str, Option<&mut RequestContext>) -> anyhow::Result<Option<String>>
        + Send
        + Sync,
{
    fn handle(
        &self,
        correlation_id: Option<&str>,
        message: &str,
        context: Option<&mut RequestContext>,
    ) -> anyhow::Result<Option<String>> {
        (self.f)(correlation_id, message, context)
    }
}

impl<F> fmt::Debug for FnProcessor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcessor").finish_non_exhaustive()
    }
}

/// Wrap a closure as a request processor.
///
/// ```
/// use servicedispatcher::processor_fn;
///
/// let upper = processor_fn(|_cid, msg, _ctx| Ok(Some(msg.to_uppercase())));
/// # let _ = upper;
/// ```
pub fn processor_fn<F>(f: F) -> FnProcessor<F>
where
    F: Fn(Option<&str>, &str, Option<&mut RequestContext>) -> anyhow::Result<Option<String>>
        + Send
        + Sync,
{
    FnProcessor { f }
}
