use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::BifrostError;

/// Supported storage providers
///
/// The set is compiled in; identifiers are compared case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Amazon S3
    SimpleStorageService,
    /// Google Cloud Storage
    GoogleCloudStorage,
    /// Wasabi, an S3-compatible store addressed per region
    WasabiCloudStorage,
    /// Pinata, a pinning service for content-addressed (IPFS) storage
    PinataCloud,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::SimpleStorageService,
        Provider::GoogleCloudStorage,
        Provider::WasabiCloudStorage,
        Provider::PinataCloud,
    ];

    /// Stable identifier used in configuration.
    pub const fn id(&self) -> &'static str {
        match self {
            Provider::SimpleStorageService => "s3",
            Provider::GoogleCloudStorage => "gcs",
            Provider::WasabiCloudStorage => "wasabi",
            Provider::PinataCloud => "pinata",
        }
    }

    /// Human-readable provider name.
    pub const fn name(&self) -> &'static str {
        match self {
            Provider::SimpleStorageService => "Simple Storage Service",
            Provider::GoogleCloudStorage => "Google Cloud Storage",
            Provider::WasabiCloudStorage => "Wasabi Cloud Storage",
            Provider::PinataCloud => "Pinata Cloud Storage",
        }
    }

    /// Whether uploads are addressed by bucket. The pinning store addresses by CID.
    pub const fn uses_buckets(&self) -> bool {
        !matches!(self, Provider::PinataCloud)
    }
}

impl FromStr for Provider {
    type Err = BifrostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Err(BifrostError::invalid_provider("no provider specified"));
        }
        Provider::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| BifrostError::invalid_provider(format!("invalid provider: {}", s)))
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.id())
    }
}
