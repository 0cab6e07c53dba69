//! Google Cloud Storage adapter

use std::time::Instant;

use async_trait::async_trait;
use bifrost_core::{
    Acl, BifrostError, BifrostResult, BridgeConfig, File, ObjectOptions, Provider, UploadedFile,
};
use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::object_access_controls::PredefinedObjectAcl;
use google_cloud_storage::http::objects::delete::DeleteObjectRequest;
use google_cloud_storage::http::objects::upload::{UploadObjectRequest, UploadType};
use google_cloud_storage::http::objects::Object;
use google_cloud_storage::http::Error as GcsError;

use crate::bridge::RainbowBridge;
use crate::connection::Connection;
use crate::source::{encode_key, prepare_upload, resolve_bucket, with_timeout};

const PUBLIC_HOST: &str = "https://storage.googleapis.com";

pub struct GcsBridge {
    config: BridgeConfig,
    connection: Connection<Client>,
}

impl GcsBridge {
    /// Authenticate with the credentials file, or Application Default Credentials.
    pub async fn connect(config: BridgeConfig) -> BifrostResult<Self> {
        let client_config = match config.credentials_file.as_ref() {
            Some(path) => {
                let credentials = CredentialsFile::new_from_file(path.display().to_string())
                    .await
                    .map_err(|e| {
                        BifrostError::unauthorized(format!(
                            "failed to read credentials file {}: {}",
                            path.display(),
                            e
                        ))
                        .with_source(e)
                    })?;
                ClientConfig::default()
                    .with_credentials(credentials)
                    .await
                    .map_err(|e| {
                        BifrostError::unauthorized(format!(
                            "failed to authenticate with Google Cloud Storage: {}",
                            e
                        ))
                        .with_source(e)
                    })?
            }
            None if config.require_explicit_credentials => {
                return Err(BifrostError::invalid_credentials(
                    "Google Cloud Storage requires a credentials file",
                ));
            }
            None => {
                tracing::debug!("No credentials file configured, using application default credentials");
                ClientConfig::default().with_auth().await.map_err(|e| {
                    BifrostError::unauthorized(format!(
                        "failed to authenticate with Google Cloud Storage: {}",
                        e
                    ))
                    .with_source(e)
                })?
            }
        };

        Ok(Self::with_client(config, client_config))
    }

    fn with_client(config: BridgeConfig, mut client_config: ClientConfig) -> Self {
        if let Some(project) = config.project.clone() {
            client_config.project_id = Some(project);
        }
        if let Some(endpoint) = config.endpoint.as_deref() {
            client_config.storage_endpoint = endpoint.trim_end_matches('/').to_string();
        }

        tracing::info!(
            bucket = config.bucket().unwrap_or_default(),
            project = config.project.as_deref().unwrap_or_default(),
            "Google Cloud Storage bridge connected"
        );

        Self {
            config,
            connection: Connection::new(Provider::GoogleCloudStorage, Client::new(client_config)),
        }
    }

    /// Public URL of an object, also used as its preview.
    pub fn public_url(bucket: &str, name: &str) -> String {
        format!("{}/{}/{}", PUBLIC_HOST, bucket, encode_key(name))
    }
}

fn predefined_acl(acl: Acl) -> PredefinedObjectAcl {
    match acl {
        Acl::PublicRead => PredefinedObjectAcl::PublicRead,
        Acl::Private => PredefinedObjectAcl::Private,
    }
}

fn is_auth_error(err: &GcsError) -> bool {
    matches!(err, GcsError::Response(resp) if resp.code == 401 || resp.code == 403)
}

#[async_trait]
impl RainbowBridge for GcsBridge {
    async fn upload_file(&self, file: File) -> BifrostResult<UploadedFile> {
        file.validate()?;
        let client = self.connection.client()?;

        let upload = prepare_upload(file, &self.config).await?;
        let bucket = resolve_bucket(&upload.options, &self.config)?;
        let name = upload.name.clone();
        let path = upload.path.clone();
        let size = upload.size();
        let start = Instant::now();

        let options = upload.options;
        let metadata = (!options.metadata.is_empty()).then_some(options.metadata);
        let object = Object {
            name: name.clone(),
            content_type: options.content_type,
            metadata,
            ..Default::default()
        };
        let request = UploadObjectRequest {
            bucket: bucket.clone(),
            predefined_acl: Some(predefined_acl(options.acl)),
            ..Default::default()
        };
        let upload_type = UploadType::Multipart(Box::new(object));

        let stored = with_timeout(self.config.timeout(), "upload", async {
            client
                .upload_object(&request, upload.data, &upload_type)
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %e,
                        bucket = %bucket,
                        key = %name,
                        size_bytes = size,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "GCS upload failed"
                    );
                    BifrostError::file_operation(format!("failed to upload {}: {}", name, e))
                        .with_source(e)
                })
        })
        .await?;

        tracing::info!(
            bucket = %bucket,
            key = %name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS upload successful"
        );

        let url = if stored.media_link.is_empty() {
            Self::public_url(&bucket, &name)
        } else {
            stored.media_link.clone()
        };

        Ok(UploadedFile {
            preview: Self::public_url(&bucket, &name),
            url,
            size: u64::try_from(stored.size).unwrap_or(size),
            provider_object: serde_json::to_value(&stored).unwrap_or_default(),
            name,
            bucket,
            path,
            cid: None,
            error: None,
        })
    }

    async fn delete_file(&self, file: &File) -> BifrostResult<()> {
        let client = self.connection.client()?;
        let name = file
            .target_name()
            .ok_or_else(|| BifrostError::invalid_parameters("file name is required to delete"))?;
        let options = ObjectOptions::parse(&file.options, self.config.public_read);
        let bucket = resolve_bucket(&options, &self.config)?;

        let request = DeleteObjectRequest {
            bucket: bucket.clone(),
            object: name.clone(),
            ..Default::default()
        };

        with_timeout(self.config.timeout(), "delete", async {
            client.delete_object(&request).await.map_err(|e| {
                let message = format!("failed to delete {}: {}", name, e);
                if is_auth_error(&e) {
                    BifrostError::unauthorized(message).with_source(e)
                } else {
                    BifrostError::file_operation(message).with_source(e)
                }
            })
        })
        .await?;

        tracing::info!(bucket = %bucket, key = %name, "GCS delete successful");
        Ok(())
    }

    async fn disconnect(&mut self) -> BifrostResult<()> {
        if self.connection.release() {
            tracing::debug!("Google Cloud Storage bridge disconnected");
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
        Provider::GoogleCloudStorage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bifrost_core::ErrorCode;

    fn anonymous_bridge() -> GcsBridge {
        let config = BridgeConfig::new("gcs")
            .with_bucket("assets")
            .with_project("demo-project")
            .with_timeout(10);
        GcsBridge::with_client(config, ClientConfig::default().anonymous())
    }

    #[test]
    fn public_url_format() {
        assert_eq!(
            GcsBridge::public_url("assets", "logo.png"),
            "https://storage.googleapis.com/assets/logo.png"
        );
        assert_eq!(
            GcsBridge::public_url("assets", "team/my file#1.png"),
            "https://storage.googleapis.com/assets/team/my%20file%231.png"
        );
    }

    #[test]
    fn acl_maps_to_predefined_acl() {
        assert!(matches!(
            predefined_acl(Acl::PublicRead),
            PredefinedObjectAcl::PublicRead
        ));
        assert!(matches!(predefined_acl(Acl::Private), PredefinedObjectAcl::Private));
    }

    #[tokio::test]
    async fn explicit_credentials_required_without_file() {
        let config = BridgeConfig::new("gcs").with_explicit_credentials(true);
        let err = GcsBridge::connect(config).await.err().unwrap();
        assert_eq!(err.code(), ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn unreadable_credentials_file_is_unauthorized() {
        let config = BridgeConfig::new("gcs").with_credentials_file("/no/such/credentials.json");
        let err = GcsBridge::connect(config).await.err().unwrap();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn config_round_trips_and_disconnect_is_idempotent() {
        let mut bridge = anonymous_bridge();
        assert!(bridge.is_connected());
        assert_eq!(bridge.config().bucket(), Some("assets"));
        assert_eq!(bridge.config().default_timeout, 10);

        bridge.disconnect().await.unwrap();
        bridge.disconnect().await.unwrap();
        assert!(!bridge.is_connected());

        let err = bridge
            .delete_file(&File::named("logo.png"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ClientError);
    }
}
