//! Configuration module
//!
//! `BridgeConfig` describes how to reach exactly one storage backend. It is built
//! in code, deserialized from JSON, or loaded from `BIFROST_*` environment variables.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BifrostError, BifrostResult};
use crate::provider::Provider;

const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Configuration for the rainbow bridge.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Identifier of the storage provider (`s3`, `gcs`, `wasabi`, `pinata`).
    pub provider: String,
    /// Service zone. Only some providers use it.
    pub zone: Option<String>,
    /// Bucket used when an upload does not name one.
    pub default_bucket: Option<String>,
    /// Path to a credentials bundle (GCS service account JSON).
    pub credentials_file: Option<PathBuf>,
    /// Access key for key-pair authentication (S3, Wasabi).
    pub access_key: Option<String>,
    /// Secret key for key-pair authentication (S3, Wasabi).
    pub secret_key: Option<String>,
    /// Service region (S3, Wasabi).
    pub region: Option<String>,
    /// Cloud project (GCS).
    pub project: Option<String>,
    /// Bearer token for the pinning service.
    pub pinata_jwt: Option<String>,
    /// Custom endpoint: S3-compatible host or pinning API base URL.
    pub endpoint: Option<String>,
    /// Timeout in seconds for a single network operation. 0 disables it.
    pub default_timeout: u64,
    /// Log warnings for non-fatal problems (missing bucket, failed batch entries).
    pub enable_debug: bool,
    /// Make uploads public unless a file says otherwise.
    pub public_read: bool,
    /// Upload batch entries concurrently, bounded by `max_concurrency`.
    pub use_async: bool,
    /// Upper bound on in-flight uploads when `use_async` is set.
    pub max_concurrency: usize,
    /// Fail construction instead of falling back to ambient credentials.
    pub require_explicit_credentials: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            zone: None,
            default_bucket: None,
            credentials_file: None,
            access_key: None,
            secret_key: None,
            region: None,
            project: None,
            pinata_jwt: None,
            endpoint: None,
            default_timeout: 0,
            enable_debug: false,
            public_read: false,
            use_async: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            require_explicit_credentials: false,
        }
    }
}

impl Debug for BridgeConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BridgeConfig")
            .field("provider", &self.provider)
            .field("zone", &self.zone)
            .field("default_bucket", &self.default_bucket)
            .field("credentials_file", &self.credentials_file)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("project", &self.project)
            .field("pinata_jwt", &self.pinata_jwt.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("default_timeout", &self.default_timeout)
            .field("enable_debug", &self.enable_debug)
            .field("public_read", &self.public_read)
            .field("use_async", &self.use_async)
            .field("max_concurrency", &self.max_concurrency)
            .field(
                "require_explicit_credentials",
                &self.require_explicit_credentials,
            )
            .finish()
    }
}

impl BridgeConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `BIFROST_*` environment variables (and `.env`).
    ///
    /// Missing variables keep their defaults; malformed numbers or booleans are errors.
    pub fn from_env() -> BifrostResult<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            provider: env::var("BIFROST_PROVIDER").unwrap_or_default(),
            zone: env_opt("BIFROST_ZONE"),
            default_bucket: env_opt("BIFROST_DEFAULT_BUCKET"),
            credentials_file: env_opt("BIFROST_CREDENTIALS_FILE")
                .or_else(|| env_opt("GOOGLE_APPLICATION_CREDENTIALS"))
                .map(PathBuf::from),
            access_key: env_opt("BIFROST_ACCESS_KEY"),
            secret_key: env_opt("BIFROST_SECRET_KEY"),
            region: env_opt("BIFROST_REGION"),
            project: env_opt("BIFROST_PROJECT"),
            pinata_jwt: env_opt("BIFROST_PINATA_JWT").or_else(|| env_opt("PINATA_JWT")),
            endpoint: env_opt("BIFROST_ENDPOINT"),
            default_timeout: env_parse("BIFROST_DEFAULT_TIMEOUT", defaults.default_timeout)?,
            enable_debug: env_parse("BIFROST_ENABLE_DEBUG", defaults.enable_debug)?,
            public_read: env_parse("BIFROST_PUBLIC_READ", defaults.public_read)?,
            use_async: env_parse("BIFROST_USE_ASYNC", defaults.use_async)?,
            max_concurrency: env_parse("BIFROST_MAX_CONCURRENCY", defaults.max_concurrency)?,
            require_explicit_credentials: env_parse(
                "BIFROST_REQUIRE_EXPLICIT_CREDENTIALS",
                defaults.require_explicit_credentials,
            )?,
        })
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.default_bucket = Some(bucket.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    pub fn with_keys(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_pinata_jwt(mut self, jwt: impl Into<String>) -> Self {
        self.pinata_jwt = Some(jwt.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.default_timeout = seconds;
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.enable_debug = enabled;
        self
    }

    pub fn with_public_read(mut self, enabled: bool) -> Self {
        self.public_read = enabled;
        self
    }

    pub fn with_async(mut self, enabled: bool, max_concurrency: usize) -> Self {
        self.use_async = enabled;
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_explicit_credentials(mut self, required: bool) -> Self {
        self.require_explicit_credentials = required;
        self
    }

    /// Parse the provider identifier.
    pub fn provider(&self) -> BifrostResult<Provider> {
        self.provider.parse()
    }

    /// Per-operation timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.default_timeout > 0).then(|| Duration::from_secs(self.default_timeout))
    }

    /// Number of uploads a batch may run at once.
    pub fn batch_workers(&self) -> usize {
        if self.use_async {
            self.max_concurrency.max(1)
        } else {
            1
        }
    }

    /// Access/secret key pair, when both halves are present and non-empty.
    pub fn key_pair(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.access_key), non_empty(&self.secret_key)) {
            (Some(access), Some(secret)) => Some((access, secret)),
            _ => None,
        }
    }

    pub fn bucket(&self) -> Option<&str> {
        non_empty(&self.default_bucket)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> BifrostResult<T> {
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| BifrostError::invalid_config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn builder_sets_fields() {
        let config = BridgeConfig::new("s3")
            .with_bucket("media")
            .with_region("eu-west-1")
            .with_keys("AKIA", "secret")
            .with_timeout(10)
            .with_public_read(true);

        assert_eq!(config.provider().unwrap(), Provider::SimpleStorageService);
        assert_eq!(config.bucket(), Some("media"));
        assert_eq!(config.key_pair(), Some(("AKIA", "secret")));
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
        assert!(config.public_read);
    }

    #[test]
    fn zero_timeout_means_none() {
        assert_eq!(BridgeConfig::new("gcs").timeout(), None);
    }

    #[test]
    fn key_pair_requires_both_halves() {
        let mut config = BridgeConfig::new("s3");
        config.access_key = Some("AKIA".to_string());
        assert_eq!(config.key_pair(), None);

        config.secret_key = Some("  ".to_string());
        assert_eq!(config.key_pair(), None);
    }

    #[test]
    fn batch_workers_follow_async_flag() {
        let config = BridgeConfig::new("s3");
        assert_eq!(config.batch_workers(), 1);

        let config = config.with_async(true, 8);
        assert_eq!(config.batch_workers(), 8);

        let config = config.with_async(true, 0);
        assert_eq!(config.batch_workers(), 1);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = BridgeConfig::new("pinata")
            .with_pinata_jwt("eyJhbGciOi.super.secret")
            .with_keys("AKIA", "very-secret");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("super.secret"));
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("AKIA"));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let config: BridgeConfig = serde_json::from_value(serde_json::json!({
            "provider": "gcs",
            "default_bucket": "assets",
            "default_timeout": 30
        }))
        .unwrap();

        assert_eq!(config.provider, "gcs");
        assert_eq!(config.bucket(), Some("assets"));
        assert_eq!(config.default_timeout, 30);
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<BridgeConfig, _> = serde_json::from_value(serde_json::json!({
            "provider": "gcs",
            "bucket_name": "assets"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn env_values_are_parsed_or_rejected() {
        env::set_var("BIFROST_TEST_PARSE_FLAG", "TRUE");
        assert!(env_parse("BIFROST_TEST_PARSE_FLAG", false).unwrap());

        env::set_var("BIFROST_TEST_PARSE_COUNT", "many");
        let err = env_parse("BIFROST_TEST_PARSE_COUNT", 4usize).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);

        assert_eq!(env_parse("BIFROST_TEST_PARSE_UNSET", 7u64).unwrap(), 7);
    }

    #[test]
    fn unknown_provider_is_reported() {
        let err = BridgeConfig::new("azure").provider().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidProvider);
    }
}
