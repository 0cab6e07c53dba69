//! Per-file upload options
//!
//! Options travel as a loosely-typed map (`key -> JSON value`) so that batch-level
//! defaults can be merged into individual files. Adapters turn the map into
//! [`ObjectOptions`] before talking to their backend. Values of the wrong shape
//! for a well-known key are ignored, never turned into errors.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Access-control setting for a stored object.
pub const OPT_ACL: &str = "acl";
/// ACL value making the object publicly readable.
pub const ACL_PUBLIC_READ: &str = "public-read";
/// ACL value keeping the object private.
pub const ACL_PRIVATE: &str = "private";
/// MIME type of the stored object.
pub const OPT_CONTENT_TYPE: &str = "content-type";
/// String-to-string metadata attached to the stored object.
pub const OPT_METADATA: &str = "metadata";
/// Bucket override for a single file.
pub const OPT_BUCKET: &str = "bucket";
/// Pinning-service options bag, passed through JSON-encoded.
pub const OPT_PINATA: &str = "pinataOptions";
/// Pinning-service metadata bag, passed through JSON-encoded.
pub const OPT_PINATA_METADATA: &str = "pinataMetadata";

/// Per-file option map.
pub type Options = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acl {
    PublicRead,
    Private,
}

impl Acl {
    pub fn is_public(&self) -> bool {
        matches!(self, Acl::PublicRead)
    }
}

/// Options of one upload, interpreted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectOptions {
    pub acl: Acl,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
    pub bucket: Option<String>,
    /// Provider-specific bags, keyed by their option name.
    pub provider_options: Map<String, Value>,
}

impl ObjectOptions {
    /// Interpret an option map.
    ///
    /// `default_public_read` applies when the map has no usable `acl` entry.
    pub fn parse(options: &Options, default_public_read: bool) -> Self {
        let mut parsed = ObjectOptions {
            acl: if default_public_read {
                Acl::PublicRead
            } else {
                Acl::Private
            },
            content_type: None,
            metadata: HashMap::new(),
            bucket: None,
            provider_options: Map::new(),
        };

        for (key, value) in options {
            match key.as_str() {
                OPT_ACL => match value.as_str() {
                    Some(ACL_PUBLIC_READ) => parsed.acl = Acl::PublicRead,
                    Some(ACL_PRIVATE) => parsed.acl = Acl::Private,
                    _ => ignored(key, value),
                },
                OPT_CONTENT_TYPE => match value.as_str() {
                    Some(content_type) if !content_type.is_empty() => {
                        parsed.content_type = Some(content_type.to_string())
                    }
                    _ => ignored(key, value),
                },
                OPT_METADATA => match value.as_object() {
                    Some(map) => {
                        for (meta_key, meta_value) in map {
                            match meta_value.as_str() {
                                Some(v) => {
                                    parsed.metadata.insert(meta_key.clone(), v.to_string());
                                }
                                None => ignored(meta_key, meta_value),
                            }
                        }
                    }
                    None => ignored(key, value),
                },
                OPT_BUCKET => match value.as_str() {
                    Some(bucket) if !bucket.trim().is_empty() => {
                        parsed.bucket = Some(bucket.trim().to_string())
                    }
                    _ => ignored(key, value),
                },
                OPT_PINATA | OPT_PINATA_METADATA => {
                    if value.is_object() {
                        parsed.provider_options.insert(key.clone(), value.clone());
                    } else {
                        ignored(key, value);
                    }
                }
                _ => {}
            }
        }

        parsed
    }
}

fn ignored(key: &str, value: &Value) {
    tracing::debug!(option = %key, value = %value, "Ignoring option with unexpected value");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Options {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn acl_falls_back_to_default_public_read() {
        let parsed = ObjectOptions::parse(&Options::new(), true);
        assert_eq!(parsed.acl, Acl::PublicRead);

        let parsed = ObjectOptions::parse(&Options::new(), false);
        assert_eq!(parsed.acl, Acl::Private);
    }

    #[test]
    fn explicit_acl_overrides_default() {
        let parsed = ObjectOptions::parse(&options(json!({ "acl": "private" })), true);
        assert_eq!(parsed.acl, Acl::Private);

        let parsed = ObjectOptions::parse(&options(json!({ "acl": "public-read" })), false);
        assert_eq!(parsed.acl, Acl::PublicRead);
    }

    #[test]
    fn wrongly_shaped_values_are_ignored() {
        let parsed = ObjectOptions::parse(
            &options(json!({
                "acl": "world-writable",
                "content-type": 42,
                "metadata": "not a map",
                "bucket": ["a"],
                "pinataOptions": "cidVersion=1"
            })),
            false,
        );

        assert_eq!(parsed.acl, Acl::Private);
        assert_eq!(parsed.content_type, None);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.bucket, None);
        assert!(parsed.provider_options.is_empty());
    }

    #[test]
    fn metadata_keeps_only_string_values() {
        let parsed = ObjectOptions::parse(
            &options(json!({
                "metadata": { "originalname": "aand.png", "size": 12 }
            })),
            false,
        );

        assert_eq!(parsed.metadata.len(), 1);
        assert_eq!(parsed.metadata["originalname"], "aand.png");
    }

    #[test]
    fn provider_bags_are_passed_through() {
        let parsed = ObjectOptions::parse(
            &options(json!({
                "content-type": "image/png",
                "bucket": "other",
                "pinataOptions": { "cidVersion": 1, "wrapWithDirectory": true }
            })),
            false,
        );

        assert_eq!(parsed.content_type.as_deref(), Some("image/png"));
        assert_eq!(parsed.bucket.as_deref(), Some("other"));
        assert_eq!(parsed.provider_options[OPT_PINATA]["cidVersion"], 1);
    }
}
