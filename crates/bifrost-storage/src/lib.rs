//! Bifrost Storage Library
//!
//! The rainbow bridge: one upload/delete interface over several object stores.
//! A [`BridgeConfig`] names the provider; [`new_rainbow_bridge`] validates it,
//! authenticates with the provider and returns the matching adapter behind the
//! [`RainbowBridge`] trait.
//!
//! Adapters are feature-gated:
//!
//! - `storage-s3`: Amazon S3 (and S3-compatible endpoints) plus Wasabi
//! - `storage-gcs`: Google Cloud Storage
//! - `storage-pinata`: Pinata IPFS pinning

#[cfg(feature = "storage-s3")]
pub(crate) mod aws;
pub mod batch;
pub mod bridge;
pub(crate) mod connection;
pub mod factory;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
#[cfg(feature = "storage-pinata")]
pub mod pinata;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub(crate) mod source;
#[cfg(feature = "storage-s3")]
pub mod wasabi;

// Re-export commonly used types
pub use bifrost_core::{
    BifrostError, BifrostResult, BridgeConfig, ErrorCode, File, FileHandle, MultiFile,
    MultiUpload, Options, Provider, UploadRequest, UploadedFile,
};
pub use bridge::RainbowBridge;
pub use factory::{config_from_value, new_rainbow_bridge, new_rainbow_bridge_from_value};
#[cfg(feature = "storage-gcs")]
pub use gcs::GcsBridge;
#[cfg(feature = "storage-pinata")]
pub use pinata::PinataBridge;
#[cfg(feature = "storage-s3")]
pub use s3::S3Bridge;
#[cfg(feature = "storage-s3")]
pub use wasabi::WasabiBridge;
