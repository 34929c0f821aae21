//! # servicedispatcher
//!
//! **servicedispatcher** is an in-process request broker. Components register
//! named request processors, and other components call them synchronously by
//! name without knowing their concrete type or where they live in the process.
//!
//! ## Architecture
//!
//! - **[`registry`]** - the name → endpoint binding table and the
//!   register/unregister lifecycle
//! - **[`dispatcher`]** - resolves a name, runs the endpoint on the caller's
//!   thread, and wraps endpoint failures
//! - **[`processor`]** - the [`RequestProcessor`] capability every endpoint implements
//! - **[`middleware`]** - observer hooks (tracing, per-service metrics)
//! - **[`runtime_config`]** / **[`logging`]** - environment-driven configuration
//!   and structured logging setup
//! - **[`cli`]** - the `servicedispatcher` command-line tool
//!
//! ### Dispatch Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Dispatcher
//!     participant Table as BindingTable
//!     participant MW as Middleware
//!     participant Endpoint as RequestProcessor
//!
//!     Caller->>Dispatcher: process_request(name, cid?, message, ctx?)
//!     Dispatcher->>MW: before()
//!     Dispatcher->>Table: get(name)
//!     alt Not bound
//!         Table-->>Dispatcher: None
//!         Dispatcher-->>Caller: ServiceNotFound
//!     end
//!     Table-->>Dispatcher: Arc<dyn RequestProcessor>
//!     Dispatcher->>Endpoint: handle(cid?, message, ctx?)
//!     alt Endpoint fails or panics
//!         Endpoint-->>Dispatcher: Err(cause)
//!         Dispatcher-->>Caller: ProcessorFailure(cause)
//!     end
//!     Endpoint-->>Dispatcher: Option<String>
//!     Dispatcher->>MW: after(outcome, latency)
//!     Dispatcher-->>Caller: Option<String>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use servicedispatcher::{processor_fn, DispatchError, Dispatcher};
//!
//! // One dispatcher per process, built at the composition root.
//! let dispatcher = Dispatcher::new();
//!
//! dispatcher
//!     .register("reverse", Arc::new(processor_fn(|_cid, msg, _ctx| {
//!         Ok(Some(msg.chars().rev().collect()))
//!     })))
//!     .unwrap();
//!
//! assert_eq!(dispatcher.process("reverse", "abc").unwrap().as_deref(), Some("cba"));
//!
//! // Names are never overwritten by accident.
//! let again = dispatcher.register("reverse", Arc::new(processor_fn(|_, _, _| Ok(None))));
//! assert!(matches!(again, Err(DispatchError::DuplicateName { .. })));
//!
//! dispatcher.unregister("reverse").unwrap();
//! assert!(matches!(
//!     dispatcher.process("reverse", "abc"),
//!     Err(DispatchError::ServiceNotFound { .. })
//! ));
//! ```
//!
//! ## Runtime Considerations
//!
//! - No threads, queues, or timeouts are introduced; a slow endpoint blocks
//!   its caller
//! - Registration state lives only as long as the process
//! - The message, correlation id, and context are passed through uninterpreted

pub mod cli;
pub mod context;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod processor;
pub mod registry;
pub mod runtime_config;

pub use context::{ContextValue, RequestContext};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, EndpointPanic, RequestProcessorError};
pub use ids::{generate_correlation_id, CorrelationId};
pub use middleware::{DispatchOutcome, Middleware};
pub use processor::{processor_fn, FnProcessor, RequestProcessor};
pub use registry::{BindingTable, Registry};
pub use runtime_config::{DispatcherConfig, DuplicatePolicy};
