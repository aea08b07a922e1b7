//! # nav-sqs CLI
//!
//! Command-line interface over the nav-sqs service facade.
//!
//! This module provides CLI commands for:
//! - Listing queues and checking whether one exists
//! - Creating queues
//! - Sending single messages and batches of up to ten
//!
//! Results go to stdout, logs to stderr.

use clap::{Parser, Subcommand};
use nav_sqs::credentials::{ACCESS_KEY_ENV, SECRET_KEY_ENV};
use nav_sqs::{
    BatchOutcome, ConfigurationError, Credentials, Message, Queue, SecretKey, SqsConfig,
    SqsError, SqsService, DEFAULT_DELAY_SECONDS, DEFAULT_VISIBILITY_TIMEOUT_SECONDS,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// ============================================================================
// CLI Structure
// ============================================================================

/// nav-sqs - Amazon SQS queues and batch sends from the command line
#[derive(Debug, Parser)]
#[command(name = "nav-sqs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "List, create and send to Amazon SQS queues")]
pub struct Cli {
    /// Configuration file path (toml, yaml or json)
    #[arg(short, long, env = "NAV_SQS_CONFIG")]
    pub config: Option<PathBuf>,

    /// AWS region, overriding the configuration
    #[arg(long)]
    pub region: Option<String>,

    /// Service endpoint, overriding the configuration
    #[arg(long)]
    pub endpoint: Option<String>,

    /// AWS access key id
    #[arg(long, env = ACCESS_KEY_ENV, hide_env_values = true)]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = SECRET_KEY_ENV, hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Logging level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List all queues
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check whether a queue exists, by name or by URL
    Exists {
        /// Queue name, compared case-insensitively
        #[arg(required_unless_present = "url", conflicts_with = "url")]
        name: Option<String>,

        /// Queue URL, compared case-insensitively
        #[arg(long)]
        url: Option<String>,
    },

    /// Create a queue
    Create {
        /// Queue name
        name: String,

        /// Visibility timeout in seconds
        #[arg(long, default_value_t = DEFAULT_VISIBILITY_TIMEOUT_SECONDS)]
        visibility: u32,

        /// Delivery delay in seconds
        #[arg(long, default_value_t = DEFAULT_DELAY_SECONDS)]
        delay: u32,
    },

    /// Send one message
    Send {
        /// Destination queue URL
        queue_url: String,

        /// Message body
        body: String,

        /// Delivery delay in seconds
        #[arg(long, default_value_t = 0)]
        delay: u32,

        /// String attribute as name=value, may be repeated
        #[arg(long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,
    },

    /// Send up to ten messages in one batch
    SendBatch {
        /// Destination queue URL
        queue_url: String,

        /// Message bodies, one message each
        #[arg(required = true, num_args = 1..)]
        bodies: Vec<String>,

        /// Delivery delay in seconds applied to every message
        #[arg(long, default_value_t = 0)]
        delay: u32,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Parse a `name=value` attribute argument
pub fn parse_attribute(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", arg)),
    }
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("{0}")]
    Sqs(#[from] SqsError),

    #[error("{failed} of {total} messages were not confirmed as sent")]
    MessagesNotSent { failed: usize, total: usize },

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Sqs(SqsError::Configuration(_)) => 1,
            Self::Sqs(SqsError::BatchConstraintViolation { .. }) => 3,
            Self::Sqs(SqsError::Validation(_)) => 4,
            Self::Sqs(_) => 2,
            Self::MessagesNotSent { .. } => 3,
            Self::CommandFailed { .. } => 2,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 2,
            Self::Json(_) => 2,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            e.print()?;
            return Err(CliError::InvalidArgument {
                arg: "command line".to_string(),
                message: e.kind().as_str().unwrap_or("invalid usage").to_string(),
            });
        }
    };

    init_logging(&cli.log_level, cli.json_logs)?;

    let config = resolve_config(&cli)?;
    let credentials = resolve_credentials(&cli)?;
    let mut service = SqsService::new(credentials, config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&mut service, cli.command, &mut out).await
}

/// Initialize logging to stderr. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str, json: bool) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| CliError::InvalidArgument {
            arg: "--log-level".to_string(),
            message: e.to_string(),
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::CommandFailed {
        message: format!("Failed to initialize logging: {}", e),
    })
}

/// Layer configuration: file and environment first, then command-line flags
pub fn resolve_config(cli: &Cli) -> Result<SqsConfig, CliError> {
    let mut config = SqsConfig::load(cli.config.as_deref())?;

    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }

    config.validate()?;
    debug!(region = %config.region, endpoint = %config.effective_endpoint(), "Resolved configuration");
    Ok(config)
}

/// Credentials from flags, falling back to the standard AWS variables
pub fn resolve_credentials(cli: &Cli) -> Result<Credentials, CliError> {
    let access_key = cli
        .access_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ConfigurationError::Missing {
            key: ACCESS_KEY_ENV.to_string(),
        })?;
    let secret_key = cli
        .secret_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ConfigurationError::Missing {
            key: SECRET_KEY_ENV.to_string(),
        })?;

    Ok(Credentials::new(access_key, SecretKey::new(secret_key)))
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Run one command against the service, writing results to `out`
pub async fn execute(
    service: &mut SqsService,
    command: Commands,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Commands::List { format } => execute_list_command(service, format, out).await,
        Commands::Exists { name, url } => execute_exists_command(service, name, url, out).await,
        Commands::Create {
            name,
            visibility,
            delay,
        } => execute_create_command(service, &name, visibility, delay, out).await,
        Commands::Send {
            queue_url,
            body,
            delay,
            attributes,
        } => execute_send_command(service, queue_url, body, delay, attributes, out).await,
        Commands::SendBatch {
            queue_url,
            bodies,
            delay,
        } => execute_send_batch_command(service, queue_url, bodies, delay, out).await,
    }
}

async fn execute_list_command(
    service: &mut SqsService,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let queues = service.queues().await?;

    match format {
        OutputFormat::Text => {
            for queue in &queues {
                writeln!(out, "{}\t{}", queue.name, queue.url)?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&queues)?)?;
        }
    }

    Ok(())
}

async fn execute_exists_command(
    service: &mut SqsService,
    name: Option<String>,
    url: Option<String>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let exists = match (name, url) {
        (_, Some(url)) => service.queue_exists_by_url(&Queue::from_url(url)).await?,
        (Some(name), None) => service.queue_exists(&name).await?,
        (None, None) => {
            return Err(CliError::InvalidArgument {
                arg: "name".to_string(),
                message: "either a queue name or --url is required".to_string(),
            })
        }
    };

    writeln!(out, "{}", exists)?;
    Ok(())
}

async fn execute_create_command(
    service: &mut SqsService,
    name: &str,
    visibility: u32,
    delay: u32,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match service
        .create_queue_with_options(name, visibility, delay)
        .await?
    {
        Some(queue) => {
            writeln!(out, "{}", queue)?;
            Ok(())
        }
        None => Err(CliError::CommandFailed {
            message: format!("queue '{}' was not created: no queue URL returned", name),
        }),
    }
}

async fn execute_send_command(
    service: &mut SqsService,
    queue_url: String,
    body: String,
    delay: u32,
    attributes: Vec<(String, String)>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let queue = Queue::from_url(queue_url);
    let mut message = attributes.into_iter().fold(
        Message::new(&queue, body).with_delay_seconds(delay),
        |message, (name, value)| message.with_attribute(name, value),
    );

    service.send_message(&mut message).await?;

    writeln!(out, "{}", message.aws_assigned_id.unwrap_or_default())?;
    Ok(())
}

async fn execute_send_batch_command(
    service: &mut SqsService,
    queue_url: String,
    bodies: Vec<String>,
    delay: u32,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let queue = Queue::from_url(queue_url);
    let mut messages: Vec<Message> = bodies
        .into_iter()
        .map(|body| Message::new(&queue, body).with_delay_seconds(delay))
        .collect();

    let report = service.send_message_batch(&mut messages).await?;

    for (batch_id, outcome) in report.entries() {
        match outcome {
            BatchOutcome::Sent { message_id } => writeln!(out, "{}\tsent {}", batch_id, message_id)?,
            BatchOutcome::Failed(error) => writeln!(
                out,
                "{}\tfailed {}: {}",
                batch_id, error.record.code, error.record.message_text
            )?,
            BatchOutcome::NotReported => writeln!(out, "{}\tunknown", batch_id)?,
        }
    }

    info!(
        sent = report.sent_count(),
        failed = report.failed_count(),
        unknown = report.not_reported_count(),
        "Batch send finished"
    );

    if report.all_sent() {
        Ok(())
    } else {
        Err(CliError::MessagesNotSent {
            failed: report.len() - report.sent_count(),
            total: report.len(),
        })
    }
}
