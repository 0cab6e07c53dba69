//! S3 client plumbing shared by the S3 and Wasabi adapters.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bifrost_core::{
    Acl, BifrostError, BifrostResult, BridgeConfig, File, ObjectOptions, Provider, UploadedFile,
};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::connection::Connection;
use crate::source::{
    encode_key, prepare_upload, resolve_bucket, with_timeout, Deadline, PreparedUpload,
};

/// Lifetime of presigned preview links for private objects.
pub(crate) const PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);

const CREDENTIALS_SOURCE: &str = "bifrost";

/// How to reach an S3-compatible service.
pub(crate) struct ClientSettings<'a> {
    pub provider: Provider,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    /// Shared-config profile used when falling back to ambient credentials.
    pub profile: Option<&'a str>,
}

/// Build an authenticated S3 client.
///
/// Explicit key pairs win. Without them the default AWS chain is used unless
/// the config requires explicit credentials. Credentials are resolved once so
/// that a missing or broken chain fails here instead of on the first upload.
pub(crate) async fn connect(
    config: &BridgeConfig,
    settings: ClientSettings<'_>,
) -> BifrostResult<Client> {
    let retry_config = RetryConfig::standard()
        .with_max_attempts(3)
        .with_retry_mode(RetryMode::Standard);

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).retry_config(retry_config);
    if let Some(region) = settings.region.clone() {
        loader = loader.region(Region::new(region));
    }

    match config.key_pair() {
        Some((access_key, secret_key)) => {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                CREDENTIALS_SOURCE,
            ));
        }
        None if config.require_explicit_credentials => {
            return Err(BifrostError::invalid_credentials(format!(
                "{} requires an access key and a secret key",
                settings.provider.name()
            )));
        }
        None => {
            tracing::debug!(
                provider = %settings.provider,
                profile = settings.profile.unwrap_or("default"),
                "No key pair configured, using ambient credentials"
            );
            if let Some(profile) = settings.profile {
                loader = loader.profile_name(profile);
            }
        }
    }

    let sdk_config = loader.load().await;

    let provider = sdk_config.credentials_provider().ok_or_else(|| {
        BifrostError::unauthorized(format!(
            "no credentials available for {}",
            settings.provider.name()
        ))
    })?;
    provider.provide_credentials().await.map_err(|e| {
        BifrostError::unauthorized(format!(
            "failed to resolve credentials for {}: {}",
            settings.provider.name(),
            e
        ))
        .with_source(e)
    })?;

    let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = settings.endpoint.as_deref() {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    Ok(Client::from_conf(builder.build()))
}

/// Upload one file and describe it, for adapters speaking the S3 protocol.
///
/// `object_url` maps `(bucket, key)` to the object's public URL, which is also
/// the preview of public objects.
pub(crate) async fn upload_file<U>(
    connection: &Connection<Client>,
    config: &BridgeConfig,
    file: File,
    object_url: U,
) -> BifrostResult<UploadedFile>
where
    U: Fn(&str, &str) -> String + Send + Sync,
{
    file.validate()?;
    let client = connection.client()?;

    let upload = prepare_upload(file, config).await?;
    let bucket = resolve_bucket(&upload.options, config)?;
    let name = upload.name.clone();
    let path = upload.path.clone();

    let stored = put_object(
        client,
        config,
        ObjectLocation {
            bucket: &bucket,
            key: &name,
        },
        upload,
    )
    .await?;

    let url = object_url(&bucket, &name);
    Ok(UploadedFile {
        preview: stored.preview.unwrap_or_else(|| url.clone()),
        url,
        name,
        bucket,
        path,
        size: stored.size,
        cid: None,
        provider_object: stored.provider_object,
        error: None,
    })
}

/// Delete the object named by `file` from its resolved bucket.
pub(crate) async fn delete_file(
    connection: &Connection<Client>,
    config: &BridgeConfig,
    file: &File,
) -> BifrostResult<()> {
    let client = connection.client()?;
    let name = file
        .target_name()
        .ok_or_else(|| BifrostError::invalid_parameters("file name is required to delete"))?;
    let options = ObjectOptions::parse(&file.options, config.public_read);
    let bucket = resolve_bucket(&options, config)?;

    delete_object(client, config, &bucket, &name).await
}

/// Where an uploaded object lives.
pub(crate) struct ObjectLocation<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
}

/// Outcome of a put followed by a head.
pub(crate) struct StoredObject {
    pub size: u64,
    pub preview: Option<String>,
    pub provider_object: Value,
}

/// Put the object, then read back its size (and a presigned preview if private).
///
/// The put, the head and the presign share one deadline.
pub(crate) async fn put_object(
    client: &Client,
    config: &BridgeConfig,
    location: ObjectLocation<'_>,
    upload: PreparedUpload,
) -> BifrostResult<StoredObject> {
    let ObjectLocation { bucket, key } = location;
    let deadline = Deadline::after(config.timeout());
    let start = Instant::now();
    let size = upload.size();
    let acl = upload.options.acl;
    let metadata: Option<HashMap<String, String>> =
        (!upload.options.metadata.is_empty()).then_some(upload.options.metadata);

    let body = ByteStream::from(Bytes::from(upload.data));
    let put = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .acl(canned_acl(acl))
        .set_content_type(upload.options.content_type)
        .set_metadata(metadata);

    let output = deadline
        .run("upload", async {
            put.send().await.map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                BifrostError::file_operation(format!(
                    "failed to upload {}: {}",
                    key,
                    DisplayErrorContext(&e)
                ))
                .with_source(e)
            })
        })
        .await?;

    let head = deadline
        .run("head object", async {
            client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    BifrostError::file_operation(format!(
                        "failed to read back {}: {}",
                        key,
                        DisplayErrorContext(&e)
                    ))
                    .with_source(e)
                })
        })
        .await?;

    let stored_size = head
        .content_length()
        .and_then(|len| u64::try_from(len).ok())
        .unwrap_or(size);

    let preview = if acl.is_public() {
        None
    } else {
        Some(presigned_get(client, &deadline, bucket, key).await?)
    };

    tracing::info!(
        bucket = %bucket,
        key = %key,
        size_bytes = stored_size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "S3 upload successful"
    );

    Ok(StoredObject {
        size: stored_size,
        preview,
        provider_object: json!({
            "e_tag": output.e_tag(),
            "version_id": output.version_id(),
            "content_length": head.content_length(),
            "content_type": head.content_type(),
            "last_modified": head.last_modified().map(|t| t.to_string()),
        }),
    })
}

async fn presigned_get(
    client: &Client,
    deadline: &Deadline,
    bucket: &str,
    key: &str,
) -> BifrostResult<String> {
    let presigning = PresigningConfig::expires_in(PRESIGN_TTL).map_err(|e| {
        BifrostError::file_operation(format!("invalid presigning config: {}", e)).with_source(e)
    })?;

    let request = deadline
        .run("presign", async {
            client
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(presigning)
                .await
                .map_err(|e| {
                    BifrostError::file_operation(format!(
                        "failed to presign {}: {}",
                        key,
                        DisplayErrorContext(&e)
                    ))
                    .with_source(e)
                })
        })
        .await?;

    Ok(request.uri().to_string())
}

pub(crate) async fn delete_object(
    client: &Client,
    config: &BridgeConfig,
    bucket: &str,
    key: &str,
) -> BifrostResult<()> {
    let start = Instant::now();

    with_timeout(config.timeout(), "delete", async {
        client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                let unauthorized = e
                    .raw_response()
                    .map(|r| matches!(r.status().as_u16(), 401 | 403))
                    .unwrap_or(false);
                let message = format!("failed to delete {}: {}", key, DisplayErrorContext(&e));
                if unauthorized {
                    BifrostError::unauthorized(message).with_source(e)
                } else {
                    BifrostError::file_operation(message).with_source(e)
                }
            })
    })
    .await?;

    tracing::info!(
        bucket = %bucket,
        key = %key,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "S3 delete successful"
    );

    Ok(())
}

fn canned_acl(acl: Acl) -> ObjectCannedAcl {
    match acl {
        Acl::PublicRead => ObjectCannedAcl::PublicRead,
        Acl::Private => ObjectCannedAcl::Private,
    }
}

/// Path-style URL on a custom endpoint: `{endpoint}/{bucket}/{key}`.
pub(crate) fn path_style_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        bucket,
        encode_key(key)
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Point the AWS credential chain at nothing: no env keys, no shared files, no IMDS.
    pub(crate) fn without_ambient_credentials() {
        for var in [
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_SESSION_TOKEN",
            "AWS_PROFILE",
            "AWS_WEB_IDENTITY_TOKEN_FILE",
            "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
            "AWS_CONTAINER_CREDENTIALS_FULL_URI",
        ] {
            std::env::remove_var(var);
        }
        std::env::set_var("AWS_CONFIG_FILE", "/nonexistent/bifrost/aws/config");
        std::env::set_var(
            "AWS_SHARED_CREDENTIALS_FILE",
            "/nonexistent/bifrost/aws/credentials",
        );
        std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
    }

    #[test]
    fn acl_maps_to_canned_acl() {
        assert_eq!(canned_acl(Acl::PublicRead), ObjectCannedAcl::PublicRead);
        assert_eq!(canned_acl(Acl::Private), ObjectCannedAcl::Private);
    }

    #[test]
    fn path_style_url_trims_trailing_slash() {
        assert_eq!(
            path_style_url("http://localhost:9000/", "media", "a.png"),
            "http://localhost:9000/media/a.png"
        );
        assert_eq!(
            path_style_url("http://localhost:9000", "media", "my file#1.png"),
            "http://localhost:9000/media/my%20file%231.png"
        );
    }

    #[tokio::test]
    async fn explicit_credentials_required_without_keys() {
        let config = BridgeConfig::new("s3").with_explicit_credentials(true);
        let settings = ClientSettings {
            provider: Provider::SimpleStorageService,
            region: Some("us-east-1".to_string()),
            endpoint: None,
            profile: None,
        };

        let err = connect(&config, settings).await.unwrap_err();
        assert_eq!(err.code(), bifrost_core::ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn key_pair_connects_without_network() {
        let config = BridgeConfig::new("s3").with_keys("AKIDEXAMPLE", "secret");
        let settings = ClientSettings {
            provider: Provider::SimpleStorageService,
            region: Some("us-east-1".to_string()),
            endpoint: Some("http://localhost:9000".to_string()),
            profile: None,
        };

        assert!(connect(&config, settings).await.is_ok());
    }
}
