//! Error types surfaced by the registry and the dispatcher.
//!
//! Broker-level failures (bad name, duplicate registration, unknown service)
//! and processor-level failures (the endpoint itself failed) are distinct
//! variants of [`DispatchError`], so callers can treat configuration mistakes
//! differently from runtime failures.

use std::fmt;

/// Failure of a registry or dispatch operation.
#[derive(Debug)]
pub enum DispatchError {
    /// Registration attempted with an empty service name.
    InvalidName,
    /// Registration attempted for a name that is already bound.
    ///
    /// The existing binding is left intact.
    DuplicateName {
        /// The name that was already bound
        name: String,
    },
    /// Unregistration attempted for a name with no current binding.
    NotFound {
        /// The name that was not bound
        name: String,
    },
    /// Dispatch attempted for a name with no current binding.
    ServiceNotFound {
        /// The requested service name
        name: String,
    },
    /// The resolved endpoint failed; the original failure is kept as the cause.
    ///
    /// Displays and chains transparently through the inner error, so the
    /// endpoint's own error is the immediate `source()`.
    ProcessorFailure(RequestProcessorError),
}

impl DispatchError {
    /// True for failures raised by the broker itself rather than by an endpoint.
    #[must_use]
    pub fn is_dispatcher_error(&self) -> bool {
        !self.is_processor_failure()
    }

    /// True when the endpoint itself failed.
    #[must_use]
    pub fn is_processor_failure(&self) -> bool {
        matches!(self, DispatchError::ProcessorFailure(_))
    }

    /// Borrow the wrapped endpoint failure, if this is one.
    #[must_use]
    pub fn as_processor_error(&self) -> Option<&RequestProcessorError> {
        match self {
            DispatchError::ProcessorFailure(err) => Some(err),
            _ => None,
        }
    }

    /// Short, stable label for the failure kind (used in logs and metrics).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::InvalidName => "invalid_name",
            DispatchError::DuplicateName { .. } => "duplicate_name",
            DispatchError::NotFound { .. } => "not_found",
            DispatchError::ServiceNotFound { .. } => "service_not_found",
            DispatchError::ProcessorFailure(_) => "processor_failure",
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::InvalidName => write!(f, "service name must not be empty"),
            DispatchError::DuplicateName { name } => {
                write!(
                    f,
                    "a request processor is already registered under '{}'; \
                    unregister it first to replace it",
                    name
                )
            }
            DispatchError::NotFound { name } => {
                write!(f, "no request processor registered under '{}'", name)
            }
            DispatchError::ServiceNotFound { name } => {
                write!(f, "service '{}' not found", name)
            }
            DispatchError::ProcessorFailure(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::ProcessorFailure(err) => std::error::Error::source(err),
            _ => None,
        }
    }
}

impl From<RequestProcessorError> for DispatchError {
    fn from(err: RequestProcessorError) -> Self {
        DispatchError::ProcessorFailure(err)
    }
}

/// An endpoint failure wrapped at the dispatch boundary.
///
/// The cause is stored unchanged; use [`RequestProcessorError::cause`] and
/// `downcast_ref` to recover the endpoint's own error type.
#[derive(Debug)]
pub struct RequestProcessorError {
    service_name: String,
    correlation_id: Option<String>,
    cause: anyhow::Error,
}

impl RequestProcessorError {
    pub fn new(
        service_name: impl Into<String>,
        correlation_id: Option<&str>,
        cause: anyhow::Error,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            correlation_id: correlation_id.map(str::to_owned),
            cause,
        }
    }

    /// Name of the service whose endpoint failed
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Correlation id of the failed call, if the caller supplied one
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// The original endpoint failure
    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    #[must_use]
    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }
}

impl fmt::Display for RequestProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request processor '{}' failed", self.service_name)
    }
}

impl std::error::Error for RequestProcessorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + 'static) = self.cause.as_ref();
        Some(cause)
    }
}

/// Cause recorded when an endpoint panics during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPanic {
    /// Panic payload rendered as text
    pub message: String,
}

impl EndpointPanic {
    /// Build from a `catch_unwind` payload.
    pub(crate) fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}

impl fmt::Display for EndpointPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint panicked: {}", self.message)
    }
}

impl std::error::Error for EndpointPanic {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn processor_failure_keeps_cause() {
        let err: DispatchError =
            RequestProcessorError::new("svc", Some("cid-1"), anyhow::Error::new(Boom)).into();

        assert!(err.is_processor_failure());
        assert!(!err.is_dispatcher_error());
        assert_eq!(err.kind(), "processor_failure");

        let inner = err.as_processor_error().unwrap();
        assert_eq!(inner.service_name(), "svc");
        assert_eq!(inner.correlation_id(), Some("cid-1"));
        assert!(inner.cause().downcast_ref::<Boom>().is_some());

        assert!(err.source().unwrap().downcast_ref::<Boom>().is_some());
        assert_eq!(err.to_string(), "request processor 'svc' failed");
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            "request processor 'svc' failed: boom"
        );
    }

    #[test]
    fn broker_errors_are_classified() {
        let cases = [
            DispatchError::InvalidName,
            DispatchError::DuplicateName { name: "a".into() },
            DispatchError::NotFound { name: "a".into() },
            DispatchError::ServiceNotFound { name: "a".into() },
        ];
        for err in &cases {
            assert!(err.is_dispatcher_error(), "{err}");
            assert!(err.source().is_none());
        }
        assert_eq!(
            DispatchError::ServiceNotFound { name: "x".into() }.to_string(),
            "service 'x' not found"
        );
    }

    #[test]
    fn panic_payloads_render_as_text() {
        let static_payload: Box<dyn std::any::Any + Send> = Box::new("static");
        let owned_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let other_payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);

        assert_eq!(EndpointPanic::from_payload(&*static_payload).message, "static");
        assert_eq!(EndpointPanic::from_payload(&*owned_payload).message, "owned");
        assert_eq!(
            EndpointPanic::from_payload(&*other_payload).message,
            "non-string panic payload"
        );
    }
}
