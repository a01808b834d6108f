// src/watch/path_utils.rs

//! Path normalisation for ignore matching.

use std::path::Path;

/// Convert `path` into a string relative to `root`, with forward slashes.
///
/// Tries a plain `strip_prefix(root)` first. If that fails (symlinked
/// roots, `/private/var` vs `/var` on macOS) both sides are canonicalized
/// and the strip is retried. A path that was just removed cannot be
/// canonicalized, so its parent is tried instead.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    if let Ok(path_canon) = path.canonicalize() {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    let parent = path.parent()?.canonicalize().ok()?;
    let name = path.file_name()?;
    parent
        .join(name)
        .strip_prefix(&root_canon)
        .ok()
        .map(to_slash)
}

/// Relative form of `path` for matching, falling back to the absolute path
/// with forward slashes when it lies outside `root`.
pub fn match_str(root: &Path, path: &Path) -> String {
    relative_str(root, path).unwrap_or_else(|| to_slash(path))
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
