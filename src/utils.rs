use std::path::{Path, PathBuf};

/// Returns the outermost ancestor of `path` (including `path` itself) that does not exist yet,
/// i.e. the directory `create_dir_all(path)` would create first.
///
/// Returns `None` when `path` already exists.
pub fn first_missing_ancestor(path: &Path) -> Option<PathBuf> {
    let mut missing = None;

    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() || ancestor.exists() {
            break;
        }
        missing = Some(ancestor.to_path_buf());
    }

    missing
}
