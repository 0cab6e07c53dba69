#[cfg(feature = "storage-gcs")]
use crate::GcsBridge;
#[cfg(feature = "storage-pinata")]
use crate::PinataBridge;
#[cfg(feature = "storage-s3")]
use crate::{S3Bridge, WasabiBridge};
use crate::RainbowBridge;
use bifrost_core::{BifrostError, BifrostResult, BridgeConfig, Provider};
use serde_json::Value;

/// Create a bridge bound to the provider named in `config`.
///
/// The provider must be one of the known identifiers (case-insensitive). A
/// missing default bucket is only a warning: uploads then need a `bucket` option.
pub async fn new_rainbow_bridge(config: &BridgeConfig) -> BifrostResult<Box<dyn RainbowBridge>> {
    let provider = config.provider()?;

    if provider.uses_buckets() && config.bucket().is_none() && config.enable_debug {
        tracing::warn!(
            provider = %provider,
            "No bucket specified for provider {}. Every upload will need a bucket option.",
            provider.name()
        );
    }

    let config = config.clone();

    match provider {
        #[cfg(feature = "storage-s3")]
        Provider::SimpleStorageService => Ok(Box::new(S3Bridge::connect(config).await?)),

        #[cfg(feature = "storage-s3")]
        Provider::WasabiCloudStorage => Ok(Box::new(WasabiBridge::connect(config).await?)),

        #[cfg(not(feature = "storage-s3"))]
        Provider::SimpleStorageService | Provider::WasabiCloudStorage => Err(
            BifrostError::invalid_provider(format!(
                "{} not available (storage-s3 feature not enabled)",
                provider.name()
            )),
        ),

        #[cfg(feature = "storage-gcs")]
        Provider::GoogleCloudStorage => Ok(Box::new(GcsBridge::connect(config).await?)),

        #[cfg(not(feature = "storage-gcs"))]
        Provider::GoogleCloudStorage => Err(BifrostError::invalid_provider(
            "Google Cloud Storage not available (storage-gcs feature not enabled)",
        )),

        #[cfg(feature = "storage-pinata")]
        Provider::PinataCloud => Ok(Box::new(PinataBridge::connect(config).await?)),

        #[cfg(not(feature = "storage-pinata"))]
        Provider::PinataCloud => Err(BifrostError::invalid_provider(
            "Pinata Cloud Storage not available (storage-pinata feature not enabled)",
        )),
    }
}

/// Create a bridge from an untyped configuration value.
///
/// `null` and values that are not a bridge configuration (wrong field types,
/// unknown fields) are rejected with `invalid config`.
pub async fn new_rainbow_bridge_from_value(value: Value) -> BifrostResult<Box<dyn RainbowBridge>> {
    let config = config_from_value(value)?;
    new_rainbow_bridge(&config).await
}

/// Check an untyped configuration value without connecting.
pub fn config_from_value(value: Value) -> BifrostResult<BridgeConfig> {
    if value.is_null() {
        return Err(BifrostError::invalid_config("config is nil"));
    }
    serde_json::from_value(value).map_err(|e| {
        BifrostError::invalid_config(format!("config must be a bridge configuration: {}", e))
            .with_source(e)
    })
}
