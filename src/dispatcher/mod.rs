//! # Dispatcher Module
//!
//! Synchronous, by-name request dispatch to registered endpoints.
//!
//! ## Request Flow
//!
//! 1. Caller invokes one of the `process*` methods with a service name
//! 2. The name is resolved against the registry's binding table
//! 3. Middleware `before` hooks run (if any are installed)
//! 4. The endpoint runs on the caller's own thread
//! 5. Middleware `after` hooks observe the outcome and latency
//! 6. The endpoint's result is returned unchanged, or its failure wrapped
//!
//! ## Error Handling
//!
//! - Unknown names fail with `ServiceNotFound`; no fallback endpoint exists
//! - Endpoint failures become `ProcessorFailure` with the original error as cause
//! - Endpoint panics are caught and reported the same way (configurable)
//! - Nothing is retried, suppressed, or logged by the dispatcher itself
//!
//! ## Concurrency
//!
//! The dispatcher introduces no threads, queues, or timeouts. Any number of
//! threads may dispatch, register, and unregister concurrently. A dispatch that
//! resolved its endpoint before a concurrent `unregister` may still complete
//! against it; any dispatch starting after the `unregister` returns observes
//! `ServiceNotFound`.
//!
//! ```rust
//! use std::sync::Arc;
//! use servicedispatcher::{processor_fn, Dispatcher, RequestContext};
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher
//!     .register("greet", Arc::new(processor_fn(|_cid, msg, ctx| {
//!         if let Some(ctx) = ctx {
//!             ctx.insert("greeted", true);
//!         }
//!         Ok(Some(format!("hello {msg}")))
//!     })))
//!     .unwrap();
//!
//! let mut ctx = RequestContext::new();
//! let reply = dispatcher.process_with_context("greet", "world", Some(&mut ctx)).unwrap();
//! assert_eq!(reply.as_deref(), Some("hello world"));
//! assert!(ctx.contains_key("greeted"));
//! ```

mod core;

pub use self::core::Dispatcher;
