#![forbid(unsafe_code)]

use kt_storage::StoreError;
use std::path::PathBuf;

#[derive(Debug)]
pub enum MigrateError {
    Io(std::io::Error),
    Store(StoreError),
    Zip(zip::result::ZipError),
    Json(serde_json::Error),
    ArchiveMissing(PathBuf),
}

impl std::fmt::Display for MigrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
            Self::Zip(err) => write!(f, "archive: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
            Self::ArchiveMissing(path) => {
                write!(f, "keys archive not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for MigrateError {}

impl From<std::io::Error> for MigrateError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for MigrateError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<zip::result::ZipError> for MigrateError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Zip(value)
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
