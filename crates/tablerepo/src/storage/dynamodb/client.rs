//! AWS SDK client setup.

use aws_sdk_dynamodb::Client;

use crate::config::{ConfigError, StoreConfig};

/// Creates a DynamoDB client for the resolved region.
///
/// Fails before any network activity when no region is configured.
pub async fn create_client(config: &StoreConfig) -> Result<Client, ConfigError> {
    let region = config.resolve_region()?;

    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region));

    if let Some(endpoint) = &config.endpoint_url {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
    }

    let sdk_config = sdk_config_loader.load().await;
    tracing::info!(target = %config.target_display(), "Created DynamoDB client");
    Ok(Client::new(&sdk_config))
}
