//! Bifrost Core Library
//!
//! Domain model shared by every Bifrost crate: the bridge configuration, the
//! provider set, upload descriptors and results, option keys and the error type.

pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod provider;

pub use config::BridgeConfig;
pub use error::{BifrostError, BifrostResult, ErrorCode};
pub use models::{File, FileHandle, MultiFile, MultiUpload, UploadRequest, UploadedFile};
pub use options::{Acl, ObjectOptions, Options};
pub use provider::Provider;
