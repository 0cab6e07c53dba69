use async_trait::async_trait;
use aws_sdk_s3::Client;
use bifrost_core::{BifrostResult, BridgeConfig, File, Provider, UploadedFile};

use crate::aws::{self, ClientSettings};
use crate::bridge::RainbowBridge;
use crate::connection::Connection;

/// Shared-config profile read when no key pair is configured.
const AMBIENT_PROFILE: &str = "wasabi";

/// Wasabi adapter: an S3-compatible store addressed per region.
pub struct WasabiBridge {
    config: BridgeConfig,
    endpoint: String,
    connection: Connection<Client>,
}

impl WasabiBridge {
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    pub async fn connect(config: BridgeConfig) -> BifrostResult<Self> {
        let region = config
            .region
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_REGION.to_string());
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| regional_endpoint(&region));

        let client = aws::connect(
            &config,
            ClientSettings {
                provider: Provider::WasabiCloudStorage,
                region: Some(region.clone()),
                endpoint: Some(endpoint.clone()),
                profile: Some(AMBIENT_PROFILE),
            },
        )
        .await?;

        tracing::info!(
            region = %region,
            endpoint = %endpoint,
            bucket = config.bucket().unwrap_or_default(),
            "Wasabi bridge connected"
        );

        Ok(Self {
            config,
            endpoint,
            connection: Connection::new(Provider::WasabiCloudStorage, client),
        })
    }

    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        aws::path_style_url(&self.endpoint, bucket, key)
    }
}

/// `https://s3.{region}.wasabisys.com`
pub fn regional_endpoint(region: &str) -> String {
    format!("https://s3.{}.wasabisys.com", region)
}

#[async_trait]
impl RainbowBridge for WasabiBridge {
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
            tracing::debug!("Wasabi bridge disconnected");
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
        Provider::WasabiCloudStorage
    }
}
