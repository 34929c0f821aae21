//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the dispatcher's runtime
//! behavior.
//!
//! ## Environment Variables
//!
//! ### `SVCD_DUPLICATE_POLICY`
//!
//! What `register` does when the name is already bound:
//! - `reject` (default): fail with `DuplicateName`, keep the existing binding
//! - `replace`: swap the binding in atomically and log a warning
//!
//! ### `SVCD_CATCH_PANICS`
//!
//! `true` (default) converts an endpoint panic into a `ProcessorFailure` whose
//! cause is an `EndpointPanic`. `false` lets the panic unwind into the caller.
//!
//! ## Usage
//!
//! ```rust
//! use servicedispatcher::runtime_config::DispatcherConfig;
//!
//! let config = DispatcherConfig::from_env();
//! println!("duplicate policy: {:?}", config.duplicate_policy);
//! ```

use std::env;

/// Policy applied when registering a name that is already bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateName`; overwrite requires unregister + register
    #[default]
    Reject,
    /// Replace the existing binding
    Replace,
}

impl DuplicatePolicy {
    /// Parse a policy name; unknown values yield `None`
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "replace" => Some(Self::Replace),
            _ => None,
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Behavior of `register` on an already-bound name (default: reject)
    pub duplicate_policy: DuplicatePolicy,
    /// Convert endpoint panics into processor failures (default: true)
    pub catch_panics: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            catch_panics: true,
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let duplicate_policy = lookup("SVCD_DUPLICATE_POLICY")
            .and_then(|s| DuplicatePolicy::parse(&s))
            .unwrap_or(defaults.duplicate_policy);
        let catch_panics = lookup("SVCD_CATCH_PANICS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.catch_panics);
        Self {
            duplicate_policy,
            catch_panics,
        }
    }

    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    #[must_use]
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}
