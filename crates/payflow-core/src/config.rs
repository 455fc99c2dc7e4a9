//! Service configuration.
//!
//! Configuration is read once at startup from an optional YAML or TOML file
//! and then from environment variables, which take precedence. Keys are the
//! lowercase forms of the environment variable names, so `SQS_QUEUE_URL` and
//! a file entry `sqs_queue_url: ...` set the same value.

use payflow_queue::{AwsSqsConfig, QueueUrl};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Log levels accepted by `LOG_LEVEL`
pub const LOG_LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// SQS returns at most this many messages per receive
pub const MAX_MESSAGES_PER_FETCH: u32 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

/// Output format of the service logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    #[serde(alias = "JSON")]
    Json,
    #[serde(alias = "PRETTY")]
    Pretty,
}

/// Service configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// One of TRACE, DEBUG, INFO, WARN or ERROR (case-insensitive)
    pub log_level: String,

    pub log_format: LogFormat,

    /// Queue holding pending payment messages
    pub sqs_queue_url: String,

    /// Failed-message store for critical failures
    pub sqs_dlq_queue_url: String,

    /// Messages pulled per invocation
    pub sqs_max_number_of_messages: u32,

    /// Endpoint of the example payment provider
    pub provider_example_request_uri: String,

    /// Provider request timeout in seconds
    pub provider_request_timeout: u64,

    pub aws_region: String,

    /// Override for LocalStack or another SQS-compatible endpoint
    pub aws_endpoint_url: Option<String>,

    pub aws_access_key_id: Option<String>,

    pub aws_secret_access_key: Option<String>,

    pub aws_session_token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
            sqs_queue_url: String::new(),
            sqs_dlq_queue_url: String::new(),
            sqs_max_number_of_messages: 1,
            provider_example_request_uri: String::new(),
            provider_request_timeout: 30,
            aws_region: "us-east-1".to_string(),
            aws_endpoint_url: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
        }
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("sqs_queue_url", &self.sqs_queue_url)
            .field("sqs_dlq_queue_url", &self.sqs_dlq_queue_url)
            .field(
                "sqs_max_number_of_messages",
                &self.sqs_max_number_of_messages,
            )
            .field(
                "provider_example_request_uri",
                &self.provider_example_request_uri,
            )
            .field("provider_request_timeout", &self.provider_request_timeout)
            .field("aws_region", &self.aws_region)
            .field("aws_endpoint_url", &self.aws_endpoint_url)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field(
                "aws_secret_access_key",
                &self.aws_secret_access_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "aws_session_token",
                &self.aws_session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl ServiceConfig {
    /// Load from an optional file and the process environment, then validate
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(file, None)
    }

    /// Load with an explicit set of environment variables instead of the
    /// process environment
    pub fn load_from(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(config::Environment::default().source(env))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_uppercase().as_str()) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "log_level '{}' must be one of {}",
                    self.log_level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }

        let main = self.queue_url()?;
        let failed = self.failed_queue_url()?;
        if main == failed {
            return Err(ConfigError::Invalid {
                message: "sqs_queue_url and sqs_dlq_queue_url must be different queues"
                    .to_string(),
            });
        }

        if !(1..=MAX_MESSAGES_PER_FETCH).contains(&self.sqs_max_number_of_messages) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "sqs_max_number_of_messages must be between 1 and {}",
                    MAX_MESSAGES_PER_FETCH
                ),
            });
        }

        if self.provider_example_request_uri.is_empty() {
            return Err(ConfigError::Missing {
                key: "provider_example_request_uri".to_string(),
            });
        }
        reqwest::Url::parse(&self.provider_example_request_uri).map_err(|e| {
            ConfigError::Invalid {
                message: format!("provider_example_request_uri: {}", e),
            }
        })?;

        if self.provider_request_timeout == 0 {
            return Err(ConfigError::Invalid {
                message: "provider_request_timeout must be greater than 0".to_string(),
            });
        }

        if self.aws_region.is_empty() {
            return Err(ConfigError::Missing {
                key: "aws_region".to_string(),
            });
        }

        if non_empty(&self.aws_access_key_id).is_some()
            != non_empty(&self.aws_secret_access_key).is_some()
        {
            return Err(ConfigError::Invalid {
                message: "aws_access_key_id and aws_secret_access_key must be set together"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Main queue URL
    pub fn queue_url(&self) -> Result<QueueUrl, ConfigError> {
        parse_queue_url("sqs_queue_url", &self.sqs_queue_url)
    }

    /// Failed-message store URL
    pub fn failed_queue_url(&self) -> Result<QueueUrl, ConfigError> {
        parse_queue_url("sqs_dlq_queue_url", &self.sqs_dlq_queue_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_request_timeout)
    }

    /// SQS provider settings
    pub fn sqs_config(&self) -> AwsSqsConfig {
        AwsSqsConfig {
            region: self.aws_region.clone(),
            endpoint_url: non_empty(&self.aws_endpoint_url),
            access_key_id: non_empty(&self.aws_access_key_id),
            secret_access_key: non_empty(&self.aws_secret_access_key),
            session_token: non_empty(&self.aws_session_token),
        }
    }
}

// An exported but empty variable counts as unset
fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

fn parse_queue_url(key: &str, value: &str) -> Result<QueueUrl, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing {
            key: key.to_string(),
        });
    }

    QueueUrl::new(value).map_err(|e| ConfigError::Invalid {
        message: format!("{}: {}", key, e),
    })
}
