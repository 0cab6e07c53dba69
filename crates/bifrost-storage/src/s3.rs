use async_trait::async_trait;
use aws_sdk_s3::Client;
use bifrost_core::{BifrostResult, BridgeConfig, File, Provider, UploadedFile};

use crate::aws::{self, ClientSettings};
use crate::bridge::RainbowBridge;
use crate::connection::Connection;
use crate::source::encode_key;

/// Amazon S3 adapter
///
/// Also talks to any S3-compatible service when `endpoint` is set, using
/// path-style addressing.
pub struct S3Bridge {
    config: BridgeConfig,
    region: String,
    connection: Connection<Client>,
}

impl S3Bridge {
    /// Region used when the configuration names none.
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    /// Create a new S3Bridge and authenticate against the service.
    pub async fn connect(config: BridgeConfig) -> BifrostResult<Self> {
        let region = config
            .region
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_REGION.to_string());

        let client = aws::connect(
            &config,
            ClientSettings {
                provider: Provider::SimpleStorageService,
                region: Some(region.clone()),
                endpoint: config.endpoint.clone(),
                profile: None,
            },
        )
        .await?;

        tracing::info!(
            region = %region,
            bucket = config.bucket().unwrap_or_default(),
            endpoint = config.endpoint.as_deref().unwrap_or_default(),
            "S3 bridge connected"
        );

        Ok(Self {
            config,
            region,
            connection: Connection::new(Provider::SimpleStorageService, client),
        })
    }

    /// Public URL of an object.
    ///
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`, or path-style on a custom endpoint.
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        match self.config.endpoint.as_deref() {
            Some(endpoint) => aws::path_style_url(endpoint, bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket,
                self.region,
                encode_key(key)
            ),
        }
    }
}

#[async_trait]
impl RainbowBridge for S3Bridge {
    async fn upload_file(&self, file: File) -> BifrostResult<UploadedFile> {
        aws::upload_file(&self.connection, &self.config, file, |bucket, key| {
            self.object_url(bucket, key)
        })
        .await
    }

    async fn delete_file(&self, file: &File) -> BifrostResult<()> {
        aws::delete_file(&self.connection, &self.config, file).await
    }

    async fn disconnect(&mut self) -> BifrostResult<()> {
        if self.connection.release() {
            tracing::debug!("S3 bridge disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn provider(&self) -> Provider {
        Provider::SimpleStorageService
    }
}
