//! Lexical path helpers. None of these touch the filesystem.

use std::path::{Component, Path, PathBuf};

/// Remove `.` components and fold `..` into its parent.
/// A leading `..` that cannot be folded is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => result.push(component),
        }
    }
    result
}

/// Join `path` onto `base` unless it is already absolute, then normalize.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}
