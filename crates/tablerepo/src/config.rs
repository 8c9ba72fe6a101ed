use std::env;

use thiserror::Error;

/// Errors raised while resolving the store configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("AWS region is missing.")]
    MissingRegion,
}

/// Store connection settings loaded from environment variables or CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// General AWS region, used when all resources live in one region.
    pub region: Option<String>,
    /// Region of the DynamoDB tables. Takes precedence over `region`.
    pub dynamodb_region: Option<String>,
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_REGION` - General AWS region
    /// - `AWS_DYNAMODB_REGION` - DynamoDB region, overrides `AWS_REGION`
    /// - `AWS_ENDPOINT_URL` - Custom endpoint, e.g. a local DynamoDB
    pub fn from_env() -> Self {
        Self {
            region: env::var("AWS_REGION").ok(),
            dynamodb_region: env::var("AWS_DYNAMODB_REGION").ok(),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
        }
    }

    /// The region the DynamoDB client should use.
    ///
    /// Blank values count as absent.
    pub fn resolve_region(&self) -> Result<String, ConfigError> {
        non_blank(&self.dynamodb_region)
            .or_else(|| non_blank(&self.region))
            .map(str::to_string)
            .ok_or(ConfigError::MissingRegion)
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match (non_blank(&self.endpoint_url), self.resolve_region()) {
            (Some(url), _) => format!("Local DynamoDB ({})", url),
            (None, Ok(region)) => format!("AWS DynamoDB (region: {})", region),
            (None, Err(_)) => "AWS DynamoDB (region: unresolved)".to_string(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_config(region: Option<&str>, dynamodb_region: Option<&str>) -> StoreConfig {
        StoreConfig {
            region: region.map(str::to_string),
            dynamodb_region: dynamodb_region.map(str::to_string),
            endpoint_url: None,
        }
    }

    #[test]
    fn test_dynamodb_region_takes_precedence() {
        let config = store_config(Some("us-east-1"), Some("eu-west-1"));
        assert_eq!(config.resolve_region().unwrap(), "eu-west-1");
    }

    #[test]
    fn test_falls_back_to_general_region() {
        let config = store_config(Some("us-east-1"), None);
        assert_eq!(config.resolve_region().unwrap(), "us-east-1");
    }

    #[test]
    fn test_blank_region_is_absent() {
        let config = store_config(Some("us-east-1"), Some("  "));
        assert_eq!(config.resolve_region().unwrap(), "us-east-1");

        let config = store_config(Some(""), None);
        assert_eq!(config.resolve_region(), Err(ConfigError::MissingRegion));
    }

    #[test]
    fn test_missing_region() {
        let err = StoreConfig::default().resolve_region().unwrap_err();
        assert_eq!(err.to_string(), "AWS region is missing.");
    }

    #[test]
    fn test_target_display() {
        let mut config = store_config(Some("us-east-1"), None);
        assert_eq!(config.target_display(), "AWS DynamoDB (region: us-east-1)");

        config.endpoint_url = Some("http://localhost:8000".to_string());
        assert_eq!(config.target_display(), "Local DynamoDB (http://localhost:8000)");
    }
}
