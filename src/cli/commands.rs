use crate::{
    context::RequestContext,
    dispatcher::Dispatcher,
    echo::register_builtin,
    ids::generate_correlation_id,
    logging::{init_logging_with_config, LogConfig},
    middleware::{MetricsMiddleware, Middleware, TracingMiddleware},
    runtime_config::DispatcherConfig,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Command-line interface for the service dispatcher
#[derive(Parser, Debug)]
#[command(name = "servicedispatcher")]
#[command(about = "In-process request broker CLI", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List registered service names
    List,
    /// Dispatch one request and print the result
    Process {
        /// Name of the service to call
        #[arg(short, long)]
        service: String,

        /// Message passed to the service
        #[arg(short, long)]
        message: String,

        /// Correlation id passed through to the service
        #[arg(long, conflicts_with = "new_correlation_id")]
        correlation_id: Option<String>,

        /// Generate a fresh correlation id for this call
        #[arg(long, default_value_t = false)]
        new_correlation_id: bool,

        /// Context entries as key=value (value parsed as JSON when possible)
        #[arg(short, long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,
    },
    /// Fire concurrent echo requests and verify every reply
    Stress {
        /// Total number of requests
        #[arg(short, long, default_value_t = 1000)]
        requests: usize,

        /// Number of caller threads
        #[arg(short, long, default_value_t = 8)]
        threads: usize,
    },
}

/// Parse `key=value` into a context entry.
///
/// The value is taken as JSON if it parses (`n=3`, `flag=true`,
/// `obj={"a":1}`), otherwise as a plain string.
///
/// # Errors
///
/// Fails when there is no `=` or the key is empty.
pub fn parse_context_pair(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("context entry '{}' is not KEY=VALUE", raw))?;
    if key.is_empty() {
        bail!("context entry '{}' has an empty key", raw);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Build the dispatcher the CLI runs against.
///
/// # Errors
///
/// Fails only if the built-in endpoints cannot be registered.
pub fn build_dispatcher(config: DispatcherConfig) -> Result<(Dispatcher, Arc<MetricsMiddleware>)> {
    let dispatcher = Dispatcher::with_config(config);
    let metrics = Arc::new(MetricsMiddleware::new());
    dispatcher.add_middleware(Arc::new(TracingMiddleware));
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);
    register_builtin(&dispatcher).context("failed to register built-in services")?;
    Ok((dispatcher, metrics))
}

/// Run one command against `dispatcher`, writing JSON to `out`.
///
/// # Errors
///
/// Dispatch failures are returned with their cause chain attached.
pub fn execute<W: Write>(
    command: &Commands,
    dispatcher: &Dispatcher,
    metrics: &MetricsMiddleware,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::List => {
            let names: Vec<String> = dispatcher.registered_services().into_iter().collect();
            writeln!(out, "{}", json!({ "services": names }))?;
        }
        Commands::Process {
            service,
            message,
            correlation_id,
            new_correlation_id,
            context,
        } => {
            let correlation_id = if *new_correlation_id {
                Some(generate_correlation_id())
            } else {
                correlation_id.clone()
            };

            let mut ctx = if context.is_empty() {
                None
            } else {
                Some(
                    context
                        .iter()
                        .map(|raw| parse_context_pair(raw))
                        .collect::<Result<RequestContext>>()?,
                )
            };

            let result = dispatcher
                .process_request(service, correlation_id.as_deref(), message, ctx.as_mut())
                .with_context(|| format!("dispatch to '{}' failed", service))?;

            writeln!(
                out,
                "{}",
                json!({
                    "service": service,
                    "correlation_id": correlation_id,
                    "result": result,
                    "context": ctx.as_ref().map(RequestContext::to_json),
                })
            )?;
        }
        Commands::Stress { requests, threads } => {
            if *threads == 0 {
                bail!("--threads must be at least 1");
            }
            let next = AtomicUsize::new(0);
            let mismatches = AtomicUsize::new(0);
            let start = Instant::now();

            thread::scope(|s| {
                for _ in 0..*threads {
                    s.spawn(|| loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= *requests {
                            break;
                        }
                        let expected = format!("msg{i}");
                        match dispatcher.process("echo", &expected) {
                            Ok(Some(reply)) if reply == expected => {}
                            _ => {
                                mismatches.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    });
                }
            });

            let elapsed = start.elapsed();
            let mismatches = mismatches.into_inner();
            writeln!(
                out,
                "{}",
                json!({
                    "requests": requests,
                    "threads": threads,
                    "mismatches": mismatches,
                    "elapsed_ms": elapsed.as_millis() as u64,
                    "metrics": metrics.service("echo"),
                })
            )?;
            if mismatches > 0 {
                bail!("{} of {} echo replies did not match", mismatches, requests);
            }
        }
    }
    Ok(())
}

/// Parse arguments, initialize logging, and run the command.
///
/// # Errors
///
/// Logging setup or command failures.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging_with_config(&LogConfig::from_env())?;
    let (dispatcher, metrics) = build_dispatcher(DispatcherConfig::from_env())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &dispatcher, &metrics, &mut out)
}
