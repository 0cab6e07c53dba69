//! Pinata pinning-service adapter
//!
//! Files are pinned to IPFS through the Pinata HTTP API and addressed by CID.
//! Authentication is a bearer JWT, checked once at construction.

use std::time::Instant;

use async_trait::async_trait;
use bifrost_core::options::{OPT_PINATA, OPT_PINATA_METADATA};
use bifrost_core::{BifrostError, BifrostResult, BridgeConfig, File, Provider, UploadedFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::bridge::RainbowBridge;
use crate::connection::Connection;
use crate::source::{prepare_upload, with_timeout, PreparedUpload};

/// Pinata API base URL.
pub const DEFAULT_API_URL: &str = "https://api.pinata.cloud";
/// Public IPFS gateway used for URLs and previews.
pub const GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs";

const AUTH_PATH: &str = "/data/testAuthentication";
const PIN_FILE_PATH: &str = "/pinning/pinFileToIPFS";
const UNPIN_PATH: &str = "/pinning/unpin";

#[derive(Debug, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: Option<AuthError>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthError {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    details: String,
}

/// Response of `pinFileToIPFS`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PinFileResponse {
    #[serde(rename = "IpfsHash", default)]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pub pin_size: u64,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Authenticated HTTP client for the Pinata API.
struct PinataClient {
    http: Client,
    base_url: String,
    jwt: String,
}

impl PinataClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.jwt)
    }
}

pub struct PinataBridge {
    config: BridgeConfig,
    connection: Connection<PinataClient>,
}

impl PinataBridge {
    /// Create the client and verify the JWT against the authentication endpoint.
    pub async fn connect(config: BridgeConfig) -> BifrostResult<Self> {
        let jwt = config
            .pinata_jwt
            .as_deref()
            .map(str::trim)
            .filter(|jwt| !jwt.is_empty())
            .ok_or_else(|| BifrostError::unauthorized("pinata JWT is required"))?
            .to_string();

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            BifrostError::client(format!("failed to create HTTP client: {}", e)).with_source(e)
        })?;

        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        let bridge = Self {
            connection: Connection::new(
                Provider::PinataCloud,
                PinataClient {
                    http,
                    base_url,
                    jwt,
                },
            ),
            config,
        };
        bridge.preflight().await?;

        tracing::info!("Pinata bridge connected");
        Ok(bridge)
    }

    /// Check that the JWT is accepted by the service.
    pub async fn preflight(&self) -> BifrostResult<()> {
        let client = self.connection.client()?;
        let request = client.authorized(client.http.get(client.url(AUTH_PATH)));

        let body: AuthResponse = with_timeout(self.config.timeout(), "preflight", async {
            let response = request.send().await.map_err(|e| {
                BifrostError::client(format!("failed to reach Pinata: {}", e)).with_source(e)
            })?;
            let text = response.text().await.map_err(|e| {
                BifrostError::client(format!("failed to read Pinata response: {}", e))
                    .with_source(e)
            })?;
            Ok(serde_json::from_str(&text).unwrap_or_default())
        })
        .await?;

        if body.message.is_empty() {
            let reason = body
                .error
                .map(|e| {
                    if e.details.is_empty() {
                        e.reason
                    } else {
                        format!("{}: {}", e.reason, e.details)
                    }
                })
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "authentication failed".to_string());
            return Err(BifrostError::unauthorized(reason));
        }

        Ok(())
    }

    pub fn gateway_url(cid: &str) -> String {
        format!("{}/{}", GATEWAY_URL, cid)
    }

    fn build_form(upload: PreparedUpload) -> BifrostResult<Form> {
        let mut part = Part::bytes(upload.data).file_name(upload.name.clone());
        if let Some(content_type) = upload.options.content_type.as_deref() {
            part = part.mime_str(content_type).map_err(|e| {
                BifrostError::bad_request(format!("invalid content type {}: {}", content_type, e))
                    .with_source(e)
            })?;
        }
        let mut form = Form::new().part("file", part);

        if let Some(pinata_options) = upload.options.provider_options.get(OPT_PINATA) {
            form = form.text(OPT_PINATA, pinata_options.to_string());
        }

        let metadata = match upload.options.provider_options.get(OPT_PINATA_METADATA) {
            Some(metadata) => Some(metadata.clone()),
            None if !upload.options.metadata.is_empty() => Some(json!({
                "name": upload.name,
                "keyvalues": upload.options.metadata,
            })),
            None => None,
        };
        if let Some(metadata) = metadata {
            form = form.text(OPT_PINATA_METADATA, metadata.to_string());
        }

        Ok(form)
    }
}

#[async_trait]
impl RainbowBridge for PinataBridge {
    async fn upload_file(&self, file: File) -> BifrostResult<UploadedFile> {
        file.validate()?;
        let client = self.connection.client()?;

        let upload = prepare_upload(file, &self.config).await?;
        let name = upload.name.clone();
        let path = upload.path.clone();
        let size = upload.size();
        let form = Self::build_form(upload)?;
        let start = Instant::now();

        let request = client.authorized(
            client
                .http
                .post(client.url(PIN_FILE_PATH))
                .multipart(form),
        );

        let pinned: PinFileResponse = with_timeout(self.config.timeout(), "upload", async {
            let response = request.send().await.map_err(|e| {
                BifrostError::file_operation(format!("failed to upload {}: {}", name, e))
                    .with_source(e)
            })?;

            let status = response.status();
            let text = response.text().await.map_err(|e| {
                BifrostError::file_operation(format!("failed to read Pinata response: {}", e))
                    .with_source(e)
            })?;

            if status == StatusCode::UNAUTHORIZED {
                return Err(BifrostError::unauthorized(format!(
                    "Pinata rejected the upload: {}",
                    text
                )));
            }
            if !status.is_success() {
                return Err(BifrostError::file_operation(format!(
                    "failed to upload {}: status {}: {}",
                    name, status, text
                )));
            }

            serde_json::from_str(&text).map_err(|e| {
                BifrostError::file_operation(format!("failed to decode Pinata response: {}", e))
                    .with_source(e)
            })
        })
        .await?;

        if let Some(error) = pinned.error.as_ref().filter(|e| !e.is_null()) {
            return Err(BifrostError::file_operation(format!(
                "failed to upload file: {}",
                error
            )));
        }

        tracing::info!(
            key = %name,
            cid = %pinned.ipfs_hash,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Pinata upload successful"
        );

        let url = Self::gateway_url(&pinned.ipfs_hash);
        Ok(UploadedFile {
            name,
            bucket: String::new(),
            path,
            size: pinned.pin_size,
            preview: url.clone(),
            url,
            cid: Some(pinned.ipfs_hash.clone()),
            provider_object: serde_json::to_value(&pinned).unwrap_or_default(),
            error: None,
        })
    }

    /// Unpin by CID. The file's target name is the CID.
    async fn delete_file(&self, file: &File) -> BifrostResult<()> {
        let client = self.connection.client()?;
        let cid = file
            .target_name()
            .ok_or_else(|| BifrostError::invalid_parameters("CID is required to unpin"))?;

        let request = client.authorized(
            client
                .http
                .delete(format!("{}/{}", client.url(UNPIN_PATH), cid)),
        );

        with_timeout(self.config.timeout(), "delete", async {
            let response = request.send().await.map_err(|e| {
                BifrostError::file_operation(format!("failed to unpin {}: {}", cid, e))
                    .with_source(e)
            })?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == StatusCode::UNAUTHORIZED {
                Err(BifrostError::unauthorized(format!(
                    "Pinata rejected the unpin: {}",
                    text
                )))
            } else {
                Err(BifrostError::file_operation(format!(
                    "failed to unpin {}: status {}: {}",
                    cid, status, text
                )))
            }
        })
        .await?;

        tracing::info!(cid = %cid, "Pinata unpin successful");
        Ok(())
    }

    async fn disconnect(&mut self) -> BifrostResult<()> {
        if self.connection.release() {
            tracing::debug!("Pinata bridge disconnected");
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
        Provider::PinataCloud
    }
}
