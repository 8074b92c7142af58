use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("could not read {path:?}")]
    CouldNotOpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error reading PE structure: {source}")]
    ContainerError {
        #[from]
        source: goblin::error::Error,
    },

    #[error("unrecognized image: optional header magic {0:#06x}")]
    UnrecognizedImage(u16),

    #[error("section {name:?} has raw data outside of the file")]
    TruncatedSection { name: String },

    #[error("no section covers virtual address {0:#x}")]
    AddressResolution(u64),

    #[error("truncated or corrupt import table: entry at offset {offset:#x} exceeds section data of {len:#x} bytes")]
    TruncatedImportTable { offset: usize, len: usize },

    #[error("could not resolve `{0}`")]
    NotFound(String),

    #[error("{0}")]
    ScanError(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

impl LookupError {
    /// Whether resolving a DLL name failed because no search directory contains it
    ///
    /// Only such failures can be skipped while resolving; a directory that can't be listed is fatal.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub fn path_to_string<P: AsRef<Path>>(p: P) -> String {
    p.as_ref().to_string_lossy().into_owned()
}

/// File name of the given path, as the key under which Windows would look it up
pub fn file_name_of<P: AsRef<Path>>(p: P) -> Result<String, LookupError> {
    p.as_ref()
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| {
            LookupError::ScanError(format!(
                "{} does not name a file",
                path_to_string(p.as_ref())
            ))
        })
}
