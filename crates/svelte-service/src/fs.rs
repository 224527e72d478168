//! File system access.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Read-only view of the file system used for everything that is not an open
/// or projected document.
pub trait FileSystem: Send + Sync {
    /// Returns true if `path` is an existing regular file.
    fn file_exists(&self, path: &Utf8Path) -> bool;

    fn read_file(&self, path: &Utf8Path) -> Option<String>;
}

/// The real file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn file_exists(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn read_file(&self, path: &Utf8Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

/// Resolves `.` and `..` components without touching the file system.
pub(crate) fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match normalized.components().next_back() {
                Some(Utf8Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}
