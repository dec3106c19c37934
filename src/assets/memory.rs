use super::{AssetError, ByteStore, DirEntry, EntryKind, Metadata};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
enum Node {
    File(Arc<[u8]>),
    Dir(BTreeMap<String, EntryKind>),
}

/// An asset bundle held entirely in memory
///
/// Built once at startup, either from a directory tree on disk
/// ([`MemoryStore::load_dir`]) or from `(path, bytes)` pairs
/// ([`MemoryStore::from_files`]). Never mutated afterwards, so lookups need no
/// synchronisation.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    nodes: HashMap<String, Node>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(String::new(), Node::Dir(BTreeMap::new()));
        Self { nodes }
    }
}

impl MemoryStore {
    /// Create an empty store containing only the root directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(path, bytes)` pairs
    ///
    /// Parent directories are created implicitly. Paths may carry a leading `/`.
    pub fn from_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, Vec<u8>)>,
        P: AsRef<str>,
    {
        let mut store = Self::default();
        for (path, bytes) in files {
            let path = path.as_ref().trim_matches('/');
            if path.is_empty() {
                continue;
            }
            store.insert_file(path, bytes);
        }
        store
    }

    /// Load every file below `root` into memory
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NotFound`] if `root` is not a directory and
    /// [`AssetError::Io`] if any entry cannot be read.
    pub fn load_dir<P: AsRef<Path>>(root: P) -> Result<Self, AssetError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(AssetError::NotFound(root.display().to_string()));
        }

        let mut store = Self::default();
        for entry in WalkDir::new(root).min_depth(1).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| AssetError::InvalidPath(e.to_string()))?;
            let virtual_path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                store.ensure_dir(&virtual_path);
            } else {
                let bytes = fs::read(entry.path())?;
                store.insert_file(&virtual_path, bytes);
            }
        }
        debug!(
            root = %root.display(),
            entries = store.nodes.len() - 1,
            "loaded asset bundle"
        );
        Ok(store)
    }

    /// Number of files in the store
    pub fn file_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n, Node::File(_)))
            .count()
    }

    fn insert_file(&mut self, path: &str, bytes: Vec<u8>) {
        let (parent, name) = split_parent(path);
        self.ensure_dir(parent);
        self.link_child(parent, name, EntryKind::File);
        self.nodes.insert(path.to_string(), Node::File(bytes.into()));
    }

    fn ensure_dir(&mut self, path: &str) {
        if let Some(Node::Dir(_)) = self.nodes.get(path) {
            return;
        }
        if !path.is_empty() {
            let (parent, name) = split_parent(path);
            self.ensure_dir(parent);
            self.link_child(parent, name, EntryKind::Dir);
        }
        self.nodes.insert(path.to_string(), Node::Dir(BTreeMap::new()));
    }

    fn link_child(&mut self, parent: &str, name: &str, kind: EntryKind) {
        if let Some(Node::Dir(children)) = self.nodes.get_mut(parent) {
            children.insert(name.to_string(), kind);
        }
    }

    fn lookup(&self, path: &str) -> Result<&Node, AssetError> {
        self.nodes
            .get(path.trim_matches('/'))
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

impl ByteStore for MemoryStore {
    fn open(&self, path: &str) -> Result<Arc<[u8]>, AssetError> {
        match self.lookup(path)? {
            Node::File(bytes) => Ok(Arc::clone(bytes)),
            Node::Dir(_) => Err(AssetError::IsADirectory(path.to_string())),
        }
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, AssetError> {
        match self.lookup(path)? {
            Node::Dir(children) => Ok(children
                .iter()
                .map(|(name, kind)| DirEntry {
                    name: name.clone(),
                    kind: *kind,
                })
                .collect()),
            Node::File(_) => Err(AssetError::NotADirectory(path.to_string())),
        }
    }

    fn stat(&self, path: &str) -> Result<Metadata, AssetError> {
        Ok(match self.lookup(path)? {
            Node::File(bytes) => Metadata {
                kind: EntryKind::File,
                len: bytes.len() as u64,
            },
            Node::Dir(children) => Metadata {
                kind: EntryKind::Dir,
                len: children.len() as u64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryStore {
        MemoryStore::from_files([
            ("index.html", b"<html></html>".to_vec()),
            ("js/app.js", b"console.log(1);".to_vec()),
            ("/js/vendor/scrollama.js", b"// vendor".to_vec()),
        ])
    }

    #[test]
    fn test_open_file() {
        let store = sample();
        assert_eq!(&store.open("js/app.js").unwrap()[..], b"console.log(1);");
        assert_eq!(store.file_count(), 3);
    }

    #[test]
    fn test_parents_are_created() {
        let store = sample();
        let root: Vec<String> = store.read_dir("").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(root, vec!["index.html", "js"]);
        let js = store.read_dir("js").unwrap();
        assert_eq!(js.len(), 2);
        assert_eq!(js[0].name, "app.js");
        assert!(!js[0].is_dir());
        assert_eq!(js[1].name, "vendor");
        assert!(js[1].is_dir());
    }

    #[test]
    fn test_wrong_type_errors() {
        let store = sample();
        assert!(matches!(store.open("js"), Err(AssetError::IsADirectory(_))));
        assert!(matches!(
            store.read_dir("index.html"),
            Err(AssetError::NotADirectory(_))
        ));
        assert!(matches!(store.open("missing.css"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_stat() {
        let store = sample();
        let meta = store.stat("index.html").unwrap();
        assert_eq!(meta.kind, EntryKind::File);
        assert_eq!(meta.len, 13);
        assert!(store.stat("js").unwrap().is_dir());
        assert!(store.stat("").unwrap().is_dir());
    }

    #[test]
    fn test_load_dir_reads_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>").unwrap();
        std::fs::write(dir.path().join("css/style.css"), "body{}").unwrap();

        let store = MemoryStore::load_dir(dir.path()).unwrap();
        assert_eq!(&store.open("css/style.css").unwrap()[..], b"body{}");
        assert!(store.read_dir("empty").unwrap().is_empty());
        assert_eq!(store.file_count(), 2);
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = MemoryStore::load_dir(dir.path().join("nope"));
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }
}
