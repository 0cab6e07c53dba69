//! Batch upload orchestration shared by every adapter.

use bifrost_core::{BifrostError, BifrostResult, File, MultiFile, MultiUpload, UploadedFile};
use futures::stream::{self, StreamExt};

use crate::bridge::RainbowBridge;

/// Upload every file of `multi` through `bridge.upload_file`.
///
/// Global options are merged into each file without overriding its own keys.
/// A failing file yields a failed slot and the batch goes on. With `use_async`
/// up to `max_concurrency` uploads run at once; slot `i` still holds file `i`.
pub async fn upload_multi_file<B>(bridge: &B, multi: MultiFile) -> BifrostResult<MultiUpload>
where
    B: RainbowBridge + ?Sized,
{
    multi.validate()?;

    if !bridge.is_connected() {
        return Err(BifrostError::client(format!(
            "no active {} client",
            bridge.provider().name()
        )));
    }

    let config = bridge.config();
    let workers = config.batch_workers();
    let total = multi.files.len();
    let MultiFile {
        files,
        global_options,
    } = multi;

    tracing::debug!(
        provider = %bridge.provider(),
        files = total,
        workers = workers,
        "Starting batch upload"
    );

    let global_options = &global_options;
    let files: Vec<UploadedFile> = stream::iter(files)
        .map(|mut file: File| async move {
            file.merge_options(global_options);

            let name = file.target_name().unwrap_or_default();
            let path = file.path.clone();

            match bridge.upload_file(file).await {
                Ok(uploaded) => uploaded,
                Err(err) => {
                    if config.enable_debug {
                        tracing::warn!(
                            provider = %bridge.provider(),
                            path = %path.display(),
                            error = %err.detailed_message(),
                            "Upload failed for file in batch"
                        );
                    }
                    UploadedFile::failed(name, path, err)
                }
            }
        })
        .buffered(workers)
        .collect()
        .await;

    let result = MultiUpload::new(files);
    tracing::info!(
        provider = %bridge.provider(),
        files = total,
        failed = result.failed_count(),
        "Batch upload finished"
    );

    Ok(result)
}
