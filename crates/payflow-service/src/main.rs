//! # Payflow Service
//!
//! Binary entry point of the payment processor.
//!
//! Each invocation:
//! - Loads configuration from an optional file and the environment
//! - Initializes logging
//! - Builds the SQS queue adapter and the provider registry
//! - Processes one batch and prints the response as JSON on stdout
//!
//! Exit codes: 0 when the batch was processed (whatever the per-message
//! outcomes), 1 when messages could not be fetched, 3 when configuration or
//! startup failed.

mod logging;

use anyhow::Context;
use clap::Parser;
use payflow_core::{
    BatchProcessor, MessageAdapter, ProviderRegistry, QueueMessageAdapter, ServiceConfig,
};
use payflow_queue::{ProviderConfig, QueueProviderFactory};
use std::error::Error as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

const EXIT_FETCH_FAILED: i32 = 1;
const EXIT_CONFIG: i32 = 3;

#[derive(Debug, Parser)]
#[command(name = "payflow", version, about = "Process one batch of pending payments")]
struct Args {
    /// YAML or TOML configuration file; environment variables override it
    #[arg(long, env = "PAYFLOW_CONFIG_FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging is configured from the same settings, so failures before it is
    // installed can only go to stderr directly
    let config = match ServiceConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Service configuration is invalid; aborting: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = logging::init(&config.log_level, config.log_format) {
        eprintln!("Failed to initialize logging; aborting: {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    info!(config = ?config, "Starting payflow");

    let processor = match build_processor(&config).await {
        Ok(processor) => processor,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to set up the payment processor; aborting");
            std::process::exit(EXIT_CONFIG);
        }
    };

    match processor.process_batch().await {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!(error = %e, "Failed to serialize the batch response");
                std::process::exit(EXIT_FETCH_FAILED);
            }
        },
        Err(e) => {
            let cause = e.source().map(ToString::to_string).unwrap_or_default();
            error!(error = %e, cause = %cause, "Batch aborted");
            eprintln!("{}", e);
            std::process::exit(EXIT_FETCH_FAILED);
        }
    }
}

/// Wire the queue adapter and provider registry into a batch processor
async fn build_processor(config: &ServiceConfig) -> anyhow::Result<BatchProcessor> {
    let queue_provider =
        QueueProviderFactory::create_provider(ProviderConfig::AwsSqs(config.sqs_config()))
            .await
            .context("failed to create the SQS client")?;

    let adapter: Arc<dyn MessageAdapter> = Arc::new(QueueMessageAdapter::new(
        queue_provider,
        config.queue_url()?,
        config.failed_queue_url()?,
        config.sqs_max_number_of_messages,
    ));

    let registry =
        ProviderRegistry::from_config(config).context("failed to build the provider registry")?;

    info!(
        queue = %config.sqs_queue_url,
        failed_queue = %config.sqs_dlq_queue_url,
        providers = ?registry.names(),
        "Payment processor ready"
    );

    Ok(BatchProcessor::new(Arc::new(registry), adapter))
}
