pub mod file;
pub mod request;
pub mod uploaded;

pub use file::{File, FileHandle, MultiFile};
pub use request::UploadRequest;
pub use uploaded::{MultiUpload, UploadedFile};
