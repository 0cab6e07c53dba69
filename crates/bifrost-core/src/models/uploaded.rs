use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::error::{BifrostError, BifrostResult, ErrorCode};

/// Result of one upload attempt.
///
/// Successful uploads carry the stored location; failed batch entries carry
/// the attempted name and path plus the error, nothing else.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub bucket: String,
    pub path: PathBuf,
    pub size: u64,
    pub url: String,
    pub preview: String,
    /// Content identifier, only set by the pinning store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    /// Raw response of the provider, for callers that need more than the fields above.
    pub provider_object: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BifrostError>,
}

impl UploadedFile {
    /// Placeholder for a batch entry that failed.
    pub fn failed(name: impl Into<String>, path: impl Into<PathBuf>, error: BifrostError) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a batch upload: one slot per input file, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MultiUpload {
    pub files: Vec<UploadedFile>,
}

impl MultiUpload {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter().filter(|f| f.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter().filter(|f| !f.is_ok())
    }

    /// Aggregate error when at least one slot failed.
    pub fn error(&self) -> Option<BifrostError> {
        let failed = self.failed_count();
        (failed > 0).then(|| {
            BifrostError::new(
                ErrorCode::IncompleteMultiFileUpload,
                format!("{} of {} files failed to upload", failed, self.files.len()),
            )
        })
    }

    /// All slots, or the aggregate error if any of them failed.
    pub fn into_result(self) -> BifrostResult<Vec<UploadedFile>> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(self.files),
        }
    }
}
