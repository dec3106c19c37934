//! # Assets Module
//!
//! Read-only virtual filesystem used to serve a presentation bundle.
//!
//! ## Overview
//!
//! Every asset source implements [`ByteStore`], a three-operation contract over
//! slash-separated virtual paths:
//!
//! - [`ByteStore::open`] - read a file's bytes
//! - [`ByteStore::read_dir`] - list a directory's children (sorted by name)
//! - [`ByteStore::stat`] - describe an entry without reading it
//!
//! Two implementations ship with the crate:
//!
//! - **[`MemoryStore`]** - a bundle loaded into memory once at startup
//! - **[`OverlayStore`]** - composes an override store ("site") over a fallback
//!   store ("library"), preferring the override on any successful lookup
//!
//! ## Paths
//!
//! Virtual paths never start with `/`; the root directory is the empty path.
//! Use [`clean_path`] to turn a URL path into a virtual path. It rejects `..`
//! segments so a request can never escape the bundle.
//!
//! ```rust
//! use scrolly::assets::{ByteStore, MemoryStore, OverlayStore};
//!
//! let site = MemoryStore::from_files([("index.html", b"<h1>site</h1>".to_vec())]);
//! let lib = MemoryStore::from_files([
//!     ("index.html", b"<h1>lib</h1>".to_vec()),
//!     ("hotkeys.js", b"// keys".to_vec()),
//! ]);
//! let overlay = OverlayStore::new(site, lib);
//!
//! assert_eq!(&overlay.open("index.html").unwrap()[..], b"<h1>site</h1>");
//! assert_eq!(&overlay.open("hotkeys.js").unwrap()[..], b"// keys");
//! ```

mod memory;
mod overlay;

pub use memory::MemoryStore;
pub use overlay::OverlayStore;

use std::fmt;
use std::io;
use std::sync::Arc;

/// Kind of entry found at a virtual path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Result of [`ByteStore::stat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Byte length for files, number of children for directories
    pub len: u64,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// One child returned by [`ByteStore::read_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Errors produced by asset lookups
#[derive(Debug)]
pub enum AssetError {
    /// Nothing exists at the path
    NotFound(String),
    /// `open` was called on a directory
    IsADirectory(String),
    /// `read_dir` was called on a file
    NotADirectory(String),
    /// The path is malformed or tries to leave the bundle
    InvalidPath(String),
    /// Underlying I/O failure, passed through unmodified
    Io(io::Error),
}

impl AssetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::NotFound(_) | AssetError::InvalidPath(_))
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound(path) => write!(f, "asset not found: '{path}'"),
            AssetError::IsADirectory(path) => write!(f, "asset is a directory: '{path}'"),
            AssetError::NotADirectory(path) => write!(f, "asset is not a directory: '{path}'"),
            AssetError::InvalidPath(path) => write!(f, "invalid asset path: '{path}'"),
            AssetError::Io(err) => write!(f, "asset I/O error: {err}"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        AssetError::Io(err)
    }
}

/// A read-only hierarchical byte namespace
///
/// Implementations must be safe to share between connection coroutines without
/// external locking.
pub trait ByteStore: Send + Sync {
    /// Read the file at `path`
    fn open(&self, path: &str) -> Result<Arc<[u8]>, AssetError>;

    /// List the children of the directory at `path`, sorted by name
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError>;

    /// Describe the entry at `path`
    fn stat(&self, path: &str) -> Result<Metadata, AssetError>;
}

impl<S: ByteStore + ?Sized> ByteStore for Arc<S> {
    fn open(&self, path: &str) -> Result<Arc<[u8]>, AssetError> {
        (**self).open(path)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError> {
        (**self).read_dir(path)
    }

    fn stat(&self, path: &str) -> Result<Metadata, AssetError> {
        (**self).stat(path)
    }
}

impl<S: ByteStore + ?Sized> ByteStore for Box<S> {
    fn open(&self, path: &str) -> Result<Arc<[u8]>, AssetError> {
        (**self).open(path)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError> {
        (**self).read_dir(path)
    }

    fn stat(&self, path: &str) -> Result<Metadata, AssetError> {
        (**self).stat(path)
    }
}

/// Normalise a URL path into a virtual store path
///
/// Leading slashes, empty segments and `.` segments are dropped. Returns
/// `None` for `..` segments or backslashes, which would let a request walk
/// out of the bundle. The root maps to the empty string.
pub fn clean_path(url_path: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}

/// Last segment of a virtual path (empty for the root)
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
