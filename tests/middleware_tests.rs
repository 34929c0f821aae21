#![allow(clippy::unwrap_used, clippy::expect_used)]

use servicedispatcher::middleware::{
    DispatchOutcome, DispatchRequest, Middleware, MetricsMiddleware, TracingMiddleware,
};
use servicedispatcher::{processor_fn, DispatchError, Dispatcher, RequestContext};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod tracing_util;
use tracing_util::TestTracing;

/// Appends `before:<tag>` / `after:<tag>` to a shared log
struct Journal {
    tag: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Middleware for Journal {
    fn before(&self, req: &DispatchRequest<'_>) {
        self.log
            .lock()
            .unwrap()
            .push(format!("before:{}:{}", self.tag, req.service_name));
    }

    fn after(&self, req: &DispatchRequest<'_>, outcome: &DispatchOutcome, _latency: Duration) {
        let status = match outcome {
            Ok(_) => "ok",
            Err(err) => err.kind(),
        };
        self.log
            .lock()
            .unwrap()
            .push(format!("after:{}:{}:{}", self.tag, req.service_name, status));
    }
}

fn dispatcher_with_services() -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(
            "echo",
            Arc::new(processor_fn(|_, msg, _| Ok(Some(msg.to_string())))),
        )
        .unwrap();
    dispatcher
        .register(
            "broken",
            Arc::new(processor_fn(|_, _, _| Err(anyhow::anyhow!("disk on fire")))),
        )
        .unwrap();
    dispatcher
}

#[test]
fn test_hooks_run_in_registration_order() {
    let dispatcher = dispatcher_with_services();
    let log = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second"] {
        dispatcher.add_middleware(Arc::new(Journal {
            tag,
            log: Arc::clone(&log),
        }));
    }

    dispatcher.process("echo", "x").unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "before:first:echo",
            "before:second:echo",
            "after:first:echo:ok",
            "after:second:echo:ok",
        ]
    );
}

#[test]
fn test_hooks_see_every_outcome_kind() {
    let dispatcher = dispatcher_with_services();
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.add_middleware(Arc::new(Journal {
        tag: "j",
        log: Arc::clone(&log),
    }));

    dispatcher.process("echo", "x").unwrap();
    dispatcher.process("broken", "x").unwrap_err();
    dispatcher.process("missing", "x").unwrap_err();

    let log = log.lock().unwrap();
    let afters: Vec<&String> = log.iter().filter(|l| l.starts_with("after")).collect();
    assert_eq!(
        afters,
        vec![
            "after:j:echo:ok",
            "after:j:broken:processor_failure",
            "after:j:missing:service_not_found",
        ]
    );
}

#[test]
fn test_middleware_does_not_alter_outcome() {
    let dispatcher = dispatcher_with_services();
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    dispatcher.add_middleware(Arc::new(MetricsMiddleware::new()));

    let mut ctx = RequestContext::new();
    assert_eq!(
        dispatcher
            .process_request("echo", Some("cid"), "same", Some(&mut ctx))
            .unwrap()
            .as_deref(),
        Some("same")
    );
    let err = dispatcher.process("broken", "x").unwrap_err();
    assert_eq!(
        err.as_processor_error().unwrap().cause().to_string(),
        "disk on fire"
    );
}

#[test]
fn test_metrics_counts_per_service() {
    let dispatcher = dispatcher_with_services();
    let metrics = Arc::new(MetricsMiddleware::new());
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);

    for _ in 0..3 {
        dispatcher.process("echo", "x").unwrap();
    }
    dispatcher.process("broken", "x").unwrap_err();
    dispatcher.process("missing", "x").unwrap_err();

    let echo = metrics.service("echo").unwrap();
    assert_eq!(echo.dispatched, 3);
    assert_eq!(echo.succeeded, 3);
    assert_eq!(echo.processor_failures, 0);

    let broken = metrics.service("broken").unwrap();
    assert_eq!(broken.dispatched, 1);
    assert_eq!(broken.processor_failures, 1);

    assert!(metrics.service("missing").is_none());
    let unresolved = metrics.unresolved();
    assert_eq!(unresolved.dispatched, 1);
    assert_eq!(unresolved.not_found, 1);

    let totals = metrics.totals();
    assert_eq!(totals.dispatched, 5);
    assert_eq!(totals.succeeded, 3);
    assert_eq!(totals.not_found, 1);

    let names: Vec<String> = metrics.snapshot().into_keys().collect();
    assert_eq!(names, vec!["broken", "echo"]);
    assert!(metrics.service("never-called").is_none());
}

#[test]
fn test_metrics_stay_bounded_for_unknown_names() {
    let dispatcher = dispatcher_with_services();
    let metrics = Arc::new(MetricsMiddleware::new());
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);

    for i in 0..10_000 {
        let err = dispatcher.process(&format!("nope-{i}"), "x").unwrap_err();
        assert!(matches!(err, DispatchError::ServiceNotFound { .. }));
    }
    dispatcher.process("echo", "x").unwrap();

    assert_eq!(metrics.tracked_services(), 1);
    assert_eq!(metrics.unresolved().not_found, 10_000);
    assert_eq!(metrics.service("echo").unwrap().succeeded, 1);
}

#[test]
fn test_metrics_under_concurrency() {
    let dispatcher = dispatcher_with_services();
    let metrics = Arc::new(MetricsMiddleware::new());
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for i in 0..100 {
                    let msg = i.to_string();
                    assert_eq!(dispatcher.process("echo", &msg).unwrap(), Some(msg));
                }
            });
        }
    });

    let echo = metrics.service("echo").unwrap();
    assert_eq!(echo.dispatched, 800);
    assert_eq!(echo.succeeded, 800);
}

#[test]
fn test_metrics_serialize_to_json() {
    let dispatcher = dispatcher_with_services();
    let metrics = Arc::new(MetricsMiddleware::new());
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);
    dispatcher.process("echo", "x").unwrap();

    let json = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(json["echo"]["dispatched"], 1);
    assert_eq!(json["echo"]["succeeded"], 1);
}

#[test]
fn test_tracing_middleware_logs_outcomes() {
    let tracing = TestTracing::init();
    let dispatcher = dispatcher_with_services();
    dispatcher.add_middleware(Arc::new(TracingMiddleware));

    dispatcher
        .process_request("echo", Some("corr-123"), "x", None)
        .unwrap();
    dispatcher.process("broken", "x").unwrap_err();
    dispatcher.process("missing", "x").unwrap_err();

    let out = tracing.output();
    assert!(out.contains("Dispatch complete"), "{out}");
    assert!(out.contains("corr-123"), "{out}");
    assert!(out.contains("Request processor failed"), "{out}");
    assert!(out.contains("disk on fire"), "{out}");
    assert!(out.contains("Dispatch rejected"), "{out}");
    assert!(out.contains("service_not_found"), "{out}");
}

#[test]
fn test_registry_changes_are_logged() {
    let tracing = TestTracing::init();
    let dispatcher = Dispatcher::new();
    for name in ["audit", "billing"] {
        dispatcher
            .register(name, Arc::new(processor_fn(|_, _, _| Ok(None))))
            .unwrap();
    }
    dispatcher.unregister("audit").unwrap();
    assert!(matches!(
        dispatcher.unregister("audit"),
        Err(DispatchError::NotFound { .. })
    ));

    let out = tracing.output();
    assert!(out.contains("Request processor registered"), "{out}");
    assert!(out.contains("Request processor unregistered"), "{out}");
    assert!(out.contains("total_services=2"), "{out}");
    assert!(
        out.contains("Request processor unregistered service_name=audit total_services=1"),
        "{out}"
    );
}
