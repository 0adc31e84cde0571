//! Recursive tree copies.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::{StageError, collect_all_files};

/// Copy every file under `src` to the mirrored path under `dest`.
///
/// Files are independent: a failed copy is recorded and the rest continue.
/// A missing `src` copies nothing.
pub fn copy_tree(src: &Path, dest: &Path) -> (Vec<PathBuf>, Vec<StageError>) {
    let mut written = Vec::new();
    let mut failures = Vec::new();

    for file in collect_all_files(src) {
        let Ok(relative) = file.strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        match copy_file(&file, &target) {
            Ok(()) => written.push(target),
            Err(err) => failures.push(err),
        }
    }

    (written, failures)
}

/// Copy one file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dest: &Path) -> Result<(), StageError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
    }
    fs::copy(src, dest).map_err(|e| StageError::io(src, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_mirrors_layout() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("public");
        fs::create_dir_all(src.join("fonts")).unwrap();
        fs::write(src.join("robots.txt"), "ok").unwrap();
        fs::write(src.join("fonts/a.woff"), "font").unwrap();

        let dest = dir.path().join("target");
        let (written, failures) = copy_tree(&src, &dest);

        assert!(failures.is_empty());
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(dest.join("robots.txt")).unwrap(), "ok");
        assert_eq!(fs::read_to_string(dest.join("fonts/a.woff")).unwrap(), "font");
    }

    #[test]
    fn test_copy_tree_missing_source() {
        let dir = TempDir::new().unwrap();
        let (written, failures) = copy_tree(&dir.path().join("nope"), &dir.path().join("out"));
        assert!(written.is_empty());
        assert!(failures.is_empty());
    }
}
