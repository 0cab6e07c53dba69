//! Upload descriptors: what to upload and with which options.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde_json::Value;
use tokio::io::AsyncRead;

use crate::error::{BifrostError, BifrostResult};
use crate::options::Options;

/// An already-open stream to upload from.
pub type FileHandle = Pin<Box<dyn AsyncRead + Send + Sync + Unpin>>;

/// One upload unit.
///
/// The source is either a filesystem path or an open handle. When both are
/// present the path wins. The stored name defaults to the path's base name.
#[derive(Default)]
pub struct File {
    pub path: PathBuf,
    pub handle: Option<FileHandle>,
    pub filename: Option<String>,
    pub options: Options,
}

impl File {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn from_handle(filename: impl Into<String>, handle: FileHandle) -> Self {
        Self {
            handle: Some(handle),
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    /// Refer to an already stored object, e.g. for deletion.
    pub fn named(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn has_path(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }

    /// Check that the file has a usable source.
    pub fn validate(&self) -> BifrostResult<()> {
        if !self.has_path() && self.handle.is_none() {
            return Err(BifrostError::invalid_parameters(
                "file must have either a path or a handle",
            ));
        }
        if !self.has_path() && self.explicit_name().is_none() {
            return Err(BifrostError::invalid_parameters(
                "filename is required when uploading from a handle",
            ));
        }
        Ok(())
    }

    /// Name the object is stored under: the explicit filename, else the path's base name.
    pub fn target_name(&self) -> Option<String> {
        self.explicit_name()
            .map(str::to_string)
            .or_else(|| base_name(&self.path))
    }

    /// Copy in every option from `global` this file does not already define.
    pub fn merge_options(&mut self, global: &Options) {
        for (key, value) in global {
            self.options
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    fn explicit_name(&self) -> Option<&str> {
        self.filename.as_deref().filter(|name| !name.is_empty())
    }
}

impl Debug for File {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("handle", &self.handle.as_ref().map(|_| "<stream>"))
            .field("filename", &self.filename)
            .field("options", &self.options)
            .finish()
    }
}

fn base_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Several files uploaded together, sharing `global_options`.
///
/// Per-file options always win over global ones.
#[derive(Debug, Default)]
pub struct MultiFile {
    pub files: Vec<File>,
    pub global_options: Options,
}

impl MultiFile {
    pub fn new(files: Vec<File>) -> Self {
        Self {
            files,
            global_options: Options::new(),
        }
    }

    pub fn with_global_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.global_options.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> BifrostResult<()> {
        if self.files.is_empty() {
            return Err(BifrostError::invalid_parameters(
                "multi file upload requires at least one file",
            ));
        }
        for (index, file) in self.files.iter().enumerate() {
            file.validate().map_err(|e| {
                BifrostError::invalid_parameters(format!("file {}: {}", index, e.message()))
            })?;
        }
        Ok(())
    }
}
