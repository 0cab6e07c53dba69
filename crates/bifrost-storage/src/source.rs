//! Reading upload sources, addressing objects and bounding provider calls.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use bifrost_core::{BifrostError, BifrostResult, BridgeConfig, File, ObjectOptions};
use tokio::io::AsyncReadExt;
use tokio::time::Instant;

/// A validated file, read into memory, with its options interpreted.
#[derive(Debug)]
pub(crate) struct PreparedUpload {
    pub name: String,
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub options: ObjectOptions,
}

impl PreparedUpload {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Read the file's content and resolve its target name.
///
/// A path takes precedence over a handle. The file is closed before returning.
pub(crate) async fn prepare_upload(
    file: File,
    config: &BridgeConfig,
) -> BifrostResult<PreparedUpload> {
    let name = file
        .target_name()
        .ok_or_else(|| BifrostError::invalid_parameters("file has no target name"))?;
    let options = ObjectOptions::parse(&file.options, config.public_read);

    let data = if file.has_path() {
        read_path(&file.path).await?
    } else if let Some(mut handle) = file.handle {
        let mut data = Vec::new();
        handle.read_to_end(&mut data).await.map_err(|e| {
            BifrostError::file_operation(format!("failed to read file handle: {}", e))
                .with_source(e)
        })?;
        data
    } else {
        return Err(BifrostError::invalid_parameters(
            "file must have either a path or a handle",
        ));
    };

    Ok(PreparedUpload {
        name,
        path: file.path,
        data,
        options,
    })
}

async fn read_path(path: &std::path::Path) -> BifrostResult<Vec<u8>> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(BifrostError::bad_request(format!(
                "file does not exist: {}",
                path.display()
            )))
        }
        Err(e) => {
            return Err(BifrostError::file_operation(format!(
                "failed to stat file {}: {}",
                path.display(),
                e
            ))
            .with_source(e))
        }
    }

    tokio::fs::read(path).await.map_err(|e| {
        BifrostError::file_operation(format!("failed to open file {}: {}", path.display(), e))
            .with_source(e)
    })
}

/// Bucket for one upload: the `bucket` option, else the configured default.
pub(crate) fn resolve_bucket(
    options: &ObjectOptions,
    config: &BridgeConfig,
) -> BifrostResult<String> {
    options
        .bucket
        .as_deref()
        .or_else(|| config.bucket())
        .map(str::to_string)
        .ok_or_else(|| BifrostError::invalid_bucket("no bucket specified"))
}

/// Percent-encode an object key for use in a URL path, keeping `/` separators.
pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Run one provider call under the configured timeout.
pub(crate) async fn with_timeout<T, F>(
    timeout: Option<Duration>,
    operation: &str,
    fut: F,
) -> BifrostResult<T>
where
    F: Future<Output = BifrostResult<T>>,
{
    Deadline::after(timeout).run(operation, fut).await
}

/// One time budget shared by several provider calls of a single operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Option<(Instant, Duration)>,
}

impl Deadline {
    /// Starts counting now; `None` never expires.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.map(|limit| (Instant::now() + limit, limit)),
        }
    }

    /// Run `fut`, failing once the shared budget is spent.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> BifrostResult<T>
    where
        F: Future<Output = BifrostResult<T>>,
    {
        match self.at {
            Some((at, limit)) => tokio::time::timeout_at(at, fut).await.map_err(|_| {
                BifrostError::file_operation(format!(
                    "{} timed out after {}s",
                    operation,
                    limit.as_secs()
                ))
            })?,
            None => fut.await,
        }
    }
}
