use super::file::{File, MultiFile};

/// Upload input: a single file or a batch.
#[derive(Debug)]
pub enum UploadRequest {
    Single(File),
    Batch(MultiFile),
}

impl From<File> for UploadRequest {
    fn from(file: File) -> Self {
        UploadRequest::Single(file)
    }
}

impl From<MultiFile> for UploadRequest {
    fn from(multi: MultiFile) -> Self {
        UploadRequest::Batch(multi)
    }
}
