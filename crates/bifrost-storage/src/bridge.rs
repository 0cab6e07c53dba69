//! Rainbow bridge trait
//!
//! This module defines the interface every storage adapter implements. Callers
//! hold a `Box<dyn RainbowBridge>` returned by the factory and never see the
//! concrete adapter.

use std::path::Path;

use async_trait::async_trait;
use bifrost_core::{
    BifrostResult, BridgeConfig, File, MultiFile, MultiUpload, Provider, UploadRequest,
    UploadedFile,
};

use crate::batch;

/// Common interface over every supported storage provider.
///
/// An adapter owns exactly one live client. `disconnect` takes `&mut self`, so it
/// cannot overlap with an upload borrowed from the same bridge.
#[async_trait]
pub trait RainbowBridge: Send + Sync {
    /// Upload exactly one file.
    ///
    /// Fails with `invalid parameters` when the file has no usable source,
    /// `client error` when disconnected, `bad request` when the path does not
    /// exist and `file operation failed` for any I/O or provider failure.
    async fn upload_file(&self, file: File) -> BifrostResult<UploadedFile>;

    /// Upload a batch of files, isolating per-file failures.
    ///
    /// Validation and connectivity problems fail the whole call before any file
    /// is touched. Otherwise the result has one slot per input file, in input order.
    async fn upload_multi_file(&self, multi: MultiFile) -> BifrostResult<MultiUpload> {
        batch::upload_multi_file(self, multi).await
    }

    /// Upload either a single file or a batch.
    ///
    /// A single file failure is returned as an error; batch failures stay per slot.
    async fn upload(&self, request: UploadRequest) -> BifrostResult<MultiUpload> {
        match request {
            UploadRequest::Single(file) => {
                let uploaded = self.upload_file(file).await?;
                Ok(MultiUpload::new(vec![uploaded]))
            }
            UploadRequest::Batch(multi) => self.upload_multi_file(multi).await,
        }
    }

    /// Recursive directory upload. No adapter walks directories yet.
    async fn upload_folder(&self, _folder: &Path) -> BifrostResult<Vec<UploadedFile>> {
        Ok(Vec::new())
    }

    /// Delete the object stored under the file's target name.
    async fn delete_file(&self, file: &File) -> BifrostResult<()>;

    /// Release the live client. Calling it again is a no-op.
    async fn disconnect(&mut self) -> BifrostResult<()>;

    fn is_connected(&self) -> bool;

    /// The configuration the adapter was built from.
    fn config(&self) -> &BridgeConfig;

    fn provider(&self) -> Provider;
}
