use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

use super::{DispatchOutcome, DispatchRequest, Middleware};
use crate::error::DispatchError;

#[derive(Debug, Default)]
struct ServiceCounters {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    processor_failures: AtomicU64,
    not_found: AtomicU64,
    total_latency_ns: AtomicU64,
}

impl ServiceCounters {
    fn record(&self, outcome: &DispatchOutcome, latency: Duration) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        let counter = match outcome {
            Ok(_) => &self.succeeded,
            Err(DispatchError::ProcessorFailure(_)) => &self.processor_failures,
            Err(_) => &self.not_found,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ServiceMetrics {
        ServiceMetrics {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            processor_failures: self.processor_failures.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            total_latency_ns: self.total_latency_ns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of one service's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceMetrics {
    pub dispatched: u64,
    pub succeeded: u64,
    pub processor_failures: u64,
    pub not_found: u64,
    pub total_latency_ns: u64,
}

impl ServiceMetrics {
    /// Mean latency over recorded dispatches; zero if none
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        if self.dispatched == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns / self.dispatched)
        }
    }

    fn merge(mut self, other: ServiceMetrics) -> Self {
        self.dispatched += other.dispatched;
        self.succeeded += other.succeeded;
        self.processor_failures += other.processor_failures;
        self.not_found += other.not_found;
        self.total_latency_ns += other.total_latency_ns;
        self
    }
}

/// Per-service dispatch counters.
///
/// A service gets its own entry only once a dispatch to it has resolved an
/// endpoint (success or processor failure). Dispatches to unbound names all
/// land in one shared [`unresolved`](Self::unresolved) bucket, so the map is
/// bounded by the set of names that were actually registered.
///
/// Everything is recorded in `after`, once the outcome is known. Updates are
/// relaxed atomics inside a `DashMap` entry, so recording never serializes
/// unrelated services.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    services: DashMap<String, ServiceCounters>,
    unresolved: ServiceCounters,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn resolved(&self, service_name: &str, outcome: &DispatchOutcome, latency: Duration) {
        if let Some(counters) = self.services.get(service_name) {
            counters.value().record(outcome, latency);
            return;
        }
        self.services
            .entry(service_name.to_owned())
            .or_default()
            .value()
            .record(outcome, latency);
    }

    /// Counters for one service, if a dispatch to it has resolved an endpoint
    #[must_use]
    pub fn service(&self, service_name: &str) -> Option<ServiceMetrics> {
        self.services
            .get(service_name)
            .map(|c| c.value().snapshot())
    }

    /// Counters for every resolved service, sorted by name
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, ServiceMetrics> {
        self.services
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect()
    }

    /// Dispatches whose name was not bound, across all names
    #[must_use]
    pub fn unresolved(&self) -> ServiceMetrics {
        self.unresolved.snapshot()
    }

    /// Number of per-service entries held
    #[must_use]
    pub fn tracked_services(&self) -> usize {
        self.services.len()
    }

    /// Sum over all services plus the unresolved bucket
    #[must_use]
    pub fn totals(&self) -> ServiceMetrics {
        self.services
            .iter()
            .fold(self.unresolved.snapshot(), |acc, entry| {
                acc.merge(entry.value().snapshot())
            })
    }
}

impl Middleware for MetricsMiddleware {
    fn after(&self, req: &DispatchRequest<'_>, outcome: &DispatchOutcome, latency: Duration) {
        match outcome {
            Ok(_) | Err(DispatchError::ProcessorFailure(_)) => {
                self.resolved(req.service_name, outcome, latency);
            }
            Err(_) => self.unresolved.record(outcome, latency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestProcessorError;

    fn request(name: &str) -> DispatchRequest<'_> {
        DispatchRequest {
            service_name: name,
            correlation_id: None,
            message: "m",
            has_context: false,
        }
    }

    #[test]
    fn outcomes_are_bucketed() {
        let metrics = MetricsMiddleware::new();
        let latency = Duration::from_micros(10);

        metrics.after(&request("svc"), &Ok(Some("x".into())), latency);
        let failure: DispatchOutcome = Err(RequestProcessorError::new(
            "svc",
            None,
            anyhow::anyhow!("boom"),
        )
        .into());
        metrics.after(&request("svc"), &failure, latency);
        let missing: DispatchOutcome = Err(DispatchError::ServiceNotFound {
            name: "ghost".into(),
        });
        metrics.after(&request("ghost"), &missing, latency);

        let svc = metrics.service("svc").unwrap();
        assert_eq!(svc.dispatched, 2);
        assert_eq!(svc.succeeded, 1);
        assert_eq!(svc.processor_failures, 1);
        assert_eq!(svc.average_latency(), latency);

        assert!(metrics.service("ghost").is_none());
        assert_eq!(metrics.unresolved().not_found, 1);
        assert_eq!(metrics.totals().dispatched, 3);
    }

    #[test]
    fn unknown_names_do_not_grow_the_map() {
        let metrics = MetricsMiddleware::new();
        for i in 0..10_000 {
            let name = format!("nope-{i}");
            let missing: DispatchOutcome = Err(DispatchError::ServiceNotFound { name: name.clone() });
            metrics.after(&request(&name), &missing, Duration::ZERO);
        }
        assert_eq!(metrics.tracked_services(), 0);
        assert!(metrics.snapshot().is_empty());
        assert_eq!(metrics.unresolved().dispatched, 10_000);
        assert_eq!(metrics.unresolved().not_found, 10_000);
    }
}
