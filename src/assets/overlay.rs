use super::{AssetError, ByteStore, DirEntry, Metadata};
use std::sync::Arc;
use tracing::trace;

/// Two stores viewed as one, the override shadowing the fallback
///
/// Each operation runs against the override store first. If and only if that
/// attempt fails (missing path, wrong entry type, any other error) the same
/// operation is retried against the fallback and its outcome is returned
/// verbatim, errors included.
///
/// Directory listings are never merged: when the override has a directory at
/// a path, the fallback's directory at that path is invisible.
#[derive(Debug, Clone)]
pub struct OverlayStore<O, F> {
    primary: O,
    fallback: F,
}

impl<O: ByteStore, F: ByteStore> OverlayStore<O, F> {
    pub fn new(primary: O, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<O: ByteStore, F: ByteStore> ByteStore for OverlayStore<O, F> {
    fn open(&self, path: &str) -> Result<Arc<[u8]>, AssetError> {
        match self.primary.open(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                trace!(path, error = %err, "override miss on open");
                self.fallback.open(path)
            }
        }
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError> {
        match self.primary.read_dir(path) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                trace!(path, error = %err, "override miss on read_dir");
                self.fallback.read_dir(path)
            }
        }
    }

    fn stat(&self, path: &str) -> Result<Metadata, AssetError> {
        match self.primary.stat(path) {
            Ok(meta) => Ok(meta),
            Err(err) => {
                trace!(path, error = %err, "override miss on stat");
                self.fallback.stat(path)
            }
        }
    }
}
