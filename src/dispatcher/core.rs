//! Dispatcher core module - hot path for request dispatch.
//!
//! Resolution reads the binding table without locking and clones the endpoint
//! handle out of it, so the endpoint always runs with no table lock held.
//! Registration changes never wait on in-flight dispatches and vice versa.

use crate::context::RequestContext;
use crate::error::{DispatchError, EndpointPanic, RequestProcessorError};
use crate::middleware::{DispatchOutcome, DispatchRequest, Middleware};
use crate::registry::{ProcessorRef, Registry};
use crate::runtime_config::DispatcherConfig;
use arc_swap::ArcSwap;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

type MiddlewareChain = Vec<Arc<dyn Middleware>>;

/// Executes requests against named endpoints and translates their failures.
///
/// A `Dispatcher` is a cheap handle: clones share the same registry and
/// middleware chain. Build one at the composition root and pass clones to
/// every registrar and caller.
///
/// The three `process*` shapes differ only in which optional inputs they
/// omit; an omitted correlation id or context reaches the endpoint as `None`,
/// never as an empty string or empty map.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Registry,
    middlewares: Arc<ArcSwap<MiddlewareChain>>,
    catch_panics: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("middlewares", &self.middlewares.load().len())
            .field("catch_panics", &self.catch_panics)
            .finish()
    }
}

impl Dispatcher {
    /// Dispatcher over a fresh registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            registry: Registry::with_policy(config.duplicate_policy),
            middlewares: Arc::new(ArcSwap::from_pointee(Vec::new())),
            catch_panics: config.catch_panics,
        }
    }

    /// Dispatcher over an existing registry handle.
    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            middlewares: Arc::new(ArcSwap::from_pointee(Vec::new())),
            catch_panics: DispatcherConfig::default().catch_panics,
        }
    }

    /// The registry this dispatcher resolves names against
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Append middleware to the chain.
    ///
    /// Middleware runs in the order added. Dispatches already in progress keep
    /// the chain they started with.
    pub fn add_middleware(&self, mw: Arc<dyn Middleware>) {
        self.middlewares.rcu(|current| {
            let mut next = MiddlewareChain::clone(current);
            next.push(Arc::clone(&mw));
            next
        });
    }

    /// See [`Registry::register`].
    ///
    /// # Errors
    ///
    /// `InvalidName` or `DuplicateName`.
    pub fn register(&self, name: &str, processor: ProcessorRef) -> Result<(), DispatchError> {
        self.registry.register(name, processor)
    }

    /// See [`Registry::unregister`].
    ///
    /// # Errors
    ///
    /// `NotFound` if `name` is not bound.
    pub fn unregister(&self, name: &str) -> Result<(), DispatchError> {
        self.registry.unregister(name)
    }

    /// See [`Registry::registered_services`].
    #[must_use]
    pub fn registered_services(&self) -> BTreeSet<String> {
        self.registry.registered_services()
    }

    /// Execute a request on the endpoint registered as `service_name`.
    ///
    /// The endpoint runs synchronously on the calling thread. Its result is
    /// returned unchanged, including `Some("")` and `None`.
    ///
    /// # Errors
    ///
    /// * `ServiceNotFound` if no endpoint is bound to `service_name`; no
    ///   fallback is ever invoked
    /// * `ProcessorFailure` if the endpoint failed, carrying its error as the
    ///   cause. With panic catching enabled, a panicking endpoint also yields
    ///   `ProcessorFailure` with an [`EndpointPanic`] cause.
    pub fn process_request(
        &self,
        service_name: &str,
        correlation_id: Option<&str>,
        message: &str,
        context: Option<&mut RequestContext>,
    ) -> DispatchOutcome {
        let request = DispatchRequest {
            service_name,
            correlation_id,
            message,
            has_context: context.is_some(),
        };

        let chain = self.middlewares.load_full();
        if chain.is_empty() {
            return self.invoke(&request, context);
        }

        for mw in chain.iter() {
            mw.before(&request);
        }
        let start = Instant::now();
        let outcome = self.invoke(&request, context);
        let latency = start.elapsed();
        for mw in chain.iter() {
            mw.after(&request, &outcome, latency);
        }
        outcome
    }

    /// [`process_request`](Self::process_request) without a correlation id.
    ///
    /// # Errors
    ///
    /// Same as `process_request`.
    pub fn process_with_context(
        &self,
        service_name: &str,
        message: &str,
        context: Option<&mut RequestContext>,
    ) -> DispatchOutcome {
        self.process_request(service_name, None, message, context)
    }

    /// [`process_request`](Self::process_request) without a correlation id or
    /// context.
    ///
    /// # Errors
    ///
    /// Same as `process_request`.
    pub fn process(&self, service_name: &str, message: &str) -> DispatchOutcome {
        self.process_request(service_name, None, message, None)
    }

    fn invoke(
        &self,
        request: &DispatchRequest<'_>,
        context: Option<&mut RequestContext>,
    ) -> DispatchOutcome {
        let processor = self.registry.lookup(request.service_name).ok_or_else(|| {
            DispatchError::ServiceNotFound {
                name: request.service_name.to_owned(),
            }
        })?;

        let result = if self.catch_panics {
            catch_unwind(AssertUnwindSafe(|| {
                processor.handle(request.correlation_id, request.message, context)
            }))
            .unwrap_or_else(|payload| Err(anyhow::Error::new(EndpointPanic::from_payload(&*payload))))
        } else {
            processor.handle(request.correlation_id, request.message, context)
        };

        result.map_err(|cause| {
            RequestProcessorError::new(request.service_name, request.correlation_id, cause).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::processor_fn;
    use crate::runtime_config::DuplicatePolicy;

    fn echo() -> ProcessorRef {
        Arc::new(processor_fn(|_, msg, _| Ok(Some(msg.to_string()))))
    }

    #[test]
    fn shapes_pass_absent_values_as_none() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(
                "inspect",
                Arc::new(processor_fn(|cid, _, ctx| {
                    Ok(Some(format!("{:?}/{}", cid, ctx.is_some())))
                })),
            )
            .unwrap();

        let mut ctx = RequestContext::new();
        assert_eq!(
            dispatcher.process("inspect", "m").unwrap().as_deref(),
            Some("None/false")
        );
        assert_eq!(
            dispatcher
                .process_with_context("inspect", "m", Some(&mut ctx))
                .unwrap()
                .as_deref(),
            Some("None/true")
        );
        assert_eq!(
            dispatcher
                .process_request("inspect", Some(""), "m", None)
                .unwrap()
                .as_deref(),
            Some("Some(\"\")/false")
        );
    }

    #[test]
    fn config_controls_duplicate_policy() {
        let dispatcher = Dispatcher::with_config(
            DispatcherConfig::default().with_duplicate_policy(DuplicatePolicy::Replace),
        );
        dispatcher.register("svc", echo()).unwrap();
        dispatcher.register("svc", echo()).unwrap();
        assert_eq!(dispatcher.registry().duplicate_policy(), DuplicatePolicy::Replace);
    }

    #[test]
    fn clones_share_registry_and_middleware() {
        let dispatcher = Dispatcher::new();
        let handle = dispatcher.clone();
        handle.register("svc", echo()).unwrap();
        handle.add_middleware(Arc::new(crate::middleware::TracingMiddleware));
        assert_eq!(dispatcher.middlewares.load().len(), 1);
        assert_eq!(dispatcher.process("svc", "hi").unwrap().as_deref(), Some("hi"));
    }

    #[test]
    fn with_registry_resolves_against_shared_registry() {
        let registry = Registry::new();
        let dispatcher = Dispatcher::with_registry(registry.clone());
        registry.register("svc", echo()).unwrap();
        assert_eq!(dispatcher.process("svc", "x").unwrap().as_deref(), Some("x"));
    }
}
