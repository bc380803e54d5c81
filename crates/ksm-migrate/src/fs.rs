//! Filesystem access used to discover and read schema sources.
//!
//! Path resolution only needs three operations, so they sit behind a trait
//! with a real implementation and an in-memory one for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// Read-only view of the schema source tree.
pub trait SchemaFs: Send + Sync {
    /// Names of the immediate subdirectories of `path`, sorted
    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Names of the regular files directly inside `path`, sorted
    fn list_files(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Full text content of a file
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    fn list_entries(path: &Path, want_dirs: bool) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let matches = if want_dirs {
                file_type.is_dir()
            } else {
                file_type.is_file()
            };
            if !matches {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    log::warn!("Skipping non UTF-8 entry {:?} in {}", raw, path.display());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SchemaFs for LocalFs {
    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>> {
        Self::list_entries(path, true)
    }

    fn list_files(&self, path: &Path) -> io::Result<Vec<String>> {
        Self::list_entries(path, false)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory file tree. Directories exist implicitly through the files
/// below them.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )
    }

    /// Relative paths of every file below `dir`.
    fn below<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a Path> + 'a {
        self.files
            .keys()
            .filter_map(move |p| p.strip_prefix(dir).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
    }
}

impl SchemaFs for MemoryFs {
    fn list_dirs(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut found = false;
        let mut dirs = BTreeSet::new();
        for rel in self.below(path) {
            found = true;
            let mut components = rel.components();
            let first = components.next();
            if components.next().is_some() {
                if let Some(first) = first {
                    dirs.insert(first.as_os_str().to_string_lossy().into_owned());
                }
            }
        }
        if !found {
            return Err(Self::not_found(path));
        }
        Ok(dirs.into_iter().collect())
    }

    fn list_files(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut found = false;
        let mut files = Vec::new();
        for rel in self.below(path) {
            found = true;
            if rel.components().count() == 1 {
                files.push(rel.to_string_lossy().into_owned());
            }
        }
        if !found {
            return Err(Self::not_found(path));
        }
        files.sort();
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }
}
