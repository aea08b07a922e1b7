//! Connection settings for the queue service.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Prefix for environment overrides, e.g. `NAV_SQS__REGION=eu-west-1`
pub const ENV_PREFIX: &str = "NAV_SQS";

/// SQS connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqsConfig {
    /// AWS region used for request signing and the default endpoint
    pub region: String,

    /// Endpoint override (LocalStack, VPC endpoints)
    pub endpoint: Option<String>,

    /// HTTP request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for SqsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            request_timeout_seconds: 30,
        }
    }
}

impl SqsConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Sources are applied in order, later ones overriding earlier ones:
    /// 1. Built-in defaults
    /// 2. `path`, if given (format chosen by file extension)
    /// 3. Environment variables prefixed `NAV_SQS__`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading SQS configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::Parsing {
                message: e.to_string(),
            })?;

        let config: SqsConfig =
            settings
                .try_deserialize()
                .map_err(|e| ConfigurationError::Parsing {
                    message: e.to_string(),
                })?;

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the transport cannot work with
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.region.trim().is_empty() {
            return Err(ConfigurationError::Invalid {
                message: "Region cannot be empty".to_string(),
            });
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                message: "Request timeout must be at least one second".to_string(),
            });
        }

        if let Some(endpoint) = &self.endpoint {
            let parsed = url::Url::parse(endpoint).map_err(|e| ConfigurationError::Invalid {
                message: format!("Invalid endpoint '{}': {}", endpoint, e),
            })?;
            if parsed.host_str().is_none() {
                return Err(ConfigurationError::Invalid {
                    message: format!("Endpoint '{}' has no host", endpoint),
                });
            }
        }

        Ok(())
    }

    /// Endpoint requests are sent to
    pub fn effective_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://sqs.{}.amazonaws.com", self.region),
        }
    }
}
