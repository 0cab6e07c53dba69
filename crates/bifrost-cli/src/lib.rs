use anyhow::{bail, Result};
use bifrost_core::options::{ACL_PRIVATE, ACL_PUBLIC_READ, OPT_ACL, OPT_CONTENT_TYPE, OPT_METADATA};
use bifrost_core::{BridgeConfig, File, Options};
use serde_json::{Map, Value};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Connection flags that override values loaded from the environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub timeout: Option<u64>,
    pub debug: bool,
    pub public_read: bool,
    pub concurrency: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: BridgeConfig) -> BridgeConfig {
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(bucket) = self.bucket {
            config.default_bucket = Some(bucket);
        }
        if let Some(region) = self.region {
            config.region = Some(region);
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = Some(endpoint);
        }
        if let Some(timeout) = self.timeout {
            config.default_timeout = timeout;
        }
        if let Some(workers) = self.concurrency {
            config.use_async = workers > 1;
            config.max_concurrency = workers;
        }
        config.enable_debug |= self.debug;
        config.public_read |= self.public_read;
        config
    }
}

/// Copy of the configuration safe to print.
pub fn redacted(config: &BridgeConfig) -> BridgeConfig {
    let mut shown = config.clone();
    shown.secret_key = shown.secret_key.map(|_| "<redacted>".to_string());
    shown.pinata_jwt = shown.pinata_jwt.map(|_| "<redacted>".to_string());
    shown
}

/// Parse `key=value` metadata pairs.
pub fn parse_metadata(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut metadata = Map::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                metadata.insert(key.trim().to_string(), Value::String(value.to_string()));
            }
            _ => bail!("metadata must be written as key=value, got '{}'", pair),
        }
    }
    Ok(metadata)
}

/// Validate an `--acl` flag value.
pub fn parse_acl(acl: &str) -> Result<String> {
    match acl {
        ACL_PUBLIC_READ | ACL_PRIVATE => Ok(acl.to_string()),
        other => bail!(
            "acl must be '{}' or '{}', got '{}'",
            ACL_PUBLIC_READ,
            ACL_PRIVATE,
            other
        ),
    }
}

/// Per-file options from CLI flags.
pub fn file_options(
    acl: Option<&str>,
    content_type: Option<&str>,
    metadata: &[String],
) -> Result<Options> {
    let mut options = Options::new();
    if let Some(acl) = acl {
        options.insert(OPT_ACL.to_string(), Value::String(parse_acl(acl)?));
    }
    if let Some(content_type) = content_type {
        options.insert(
            OPT_CONTENT_TYPE.to_string(),
            Value::String(content_type.to_string()),
        );
    }
    let metadata = parse_metadata(metadata)?;
    if !metadata.is_empty() {
        options.insert(OPT_METADATA.to_string(), Value::Object(metadata));
    }
    Ok(options)
}

/// Build the file descriptor for `upload`.
pub fn upload_file(path: std::path::PathBuf, name: Option<String>, options: Options) -> File {
    let mut file = File::from_path(path);
    file.filename = name;
    file.options = options;
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_pairs_are_parsed() {
        let pairs = vec!["album=summer".to_string(), "note=a=b".to_string()];
        let metadata = parse_metadata(&pairs).unwrap();
        assert_eq!(metadata["album"], "summer");
        assert_eq!(metadata["note"], "a=b");
    }

    #[test]
    fn malformed_metadata_is_rejected() {
        assert!(parse_metadata(&["novalue".to_string()]).is_err());
        assert!(parse_metadata(&["=value".to_string()]).is_err());
    }

    #[test]
    fn acl_values_are_checked() {
        assert_eq!(parse_acl("private").unwrap(), "private");
        assert!(parse_acl("world").is_err());
    }

    #[test]
    fn options_include_only_given_flags() {
        let options = file_options(Some("public-read"), None, &[]).unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options["acl"], "public-read");

        let options = file_options(None, Some("image/png"), &["k=v".to_string()]).unwrap();
        assert_eq!(options["content-type"], "image/png");
        assert_eq!(options["metadata"]["k"], "v");
    }

    #[test]
    fn printed_config_hides_secrets() {
        let config = BridgeConfig::new("s3").with_keys("AKIA", "very-secret");
        let shown = serde_json::to_string(&redacted(&config)).unwrap();
        assert!(!shown.contains("very-secret"));
        assert!(shown.contains("AKIA"));
    }

    #[test]
    fn overrides_win_over_environment() {
        let base = BridgeConfig::new("s3").with_bucket("env-bucket");
        let config = ConfigOverrides {
            provider: Some("wasabi".to_string()),
            bucket: Some("flag-bucket".to_string()),
            concurrency: Some(4),
            debug: true,
            ..Default::default()
        }
        .apply(base);

        assert_eq!(config.provider, "wasabi");
        assert_eq!(config.bucket(), Some("flag-bucket"));
        assert!(config.use_async);
        assert_eq!(config.batch_workers(), 4);
        assert!(config.enable_debug);
    }
}
