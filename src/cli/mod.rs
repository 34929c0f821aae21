//! # CLI Module
//!
//! Command-line front end for exercising a dispatcher from the shell.
//!
//! The binary acts as a composition root: it builds one [`Dispatcher`]
//! from environment configuration, installs tracing and metrics middleware,
//! registers the built-in endpoints (`echo`, `upper`, `fail`), and then runs a
//! single command against it.
//!
//! ## Commands
//!
//! ```bash
//! servicedispatcher list
//! servicedispatcher process --service upper --message hello
//! servicedispatcher process --service echo --message hi --new-correlation-id --context user=alice
//! servicedispatcher stress --requests 1000 --threads 8
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.
//!
//! [`Dispatcher`]: crate::dispatcher::Dispatcher

mod commands;

pub use self::commands::{build_dispatcher, execute, parse_context_pair, run_cli, Cli, Commands};
