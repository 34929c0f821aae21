mod core;
mod metrics;
mod tracing;

pub use self::core::{DispatchOutcome, DispatchRequest, Middleware};
pub use self::metrics::{MetricsMiddleware, ServiceMetrics};
pub use self::tracing::TracingMiddleware;
